pub mod camera;
pub mod config;
pub mod error;
pub mod models;
pub mod nvr;
pub mod settings;
pub mod snapshot;
pub mod transport;

pub use camera::{CameraApi, CameraClient};
pub use config::{CameraConfig, NvrConfig};
pub use error::{Error, Result, TransportError};
pub use models::{CameraIdentifier, CameraRecord, RecordMode, RecordingChannel, ServerVersion};
pub use nvr::NvrClient;
pub use snapshot::fetch_snapshot;
