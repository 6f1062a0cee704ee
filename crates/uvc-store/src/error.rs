use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Store contents are invalid: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unable to locate store: {0}")]
    Location(String),
}
