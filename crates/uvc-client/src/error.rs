use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unable to contact camera: {0}")]
    CameraConnect(String),

    #[error("Camera authentication failed: {0}")]
    CameraAuth(String),

    #[error("NVR reported authorization failure")]
    NotAuthorized,

    #[error("NVR error: {0}")]
    Nvr(String),

    #[error("NVR request failed: {0}")]
    NvrStatus(u16),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of the HTTP exchange itself, before any status code is seen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            TransportError::Connection(error.to_string())
        } else {
            TransportError::Protocol(error.to_string())
        }
    }
}
