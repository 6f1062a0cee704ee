pub mod commands;
pub mod config;
pub mod context;
pub mod format;
pub mod logging;

mod error;

pub use error::{Error, Result};
