use tokio_postgres::error::SqlState;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Request timed out")]
    RequestTimeout,

    #[error("Too many requests")]
    TooManyRequests,

    #[error("No internet connection")]
    NoInternet,

    #[error("Server error")]
    ServerError,

    #[error("Failed to deserialize response")]
    Serialization,

    #[error("Unknown remote error")]
    Unknown,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalError {
    #[error("Storage is full")]
    DiskFull,

    /// A record exists but could not be decoded
    #[error("Stored record is malformed: {0}")]
    Malformed(String),

    #[error("Local storage failure {0}")]
    Unknown(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Local(#[from] LocalError),
}

impl From<serde_json::Error> for LocalError {
    fn from(err: serde_json::Error) -> Self {
        LocalError::Malformed(err.to_string())
    }
}

impl From<tokio_postgres::Error> for LocalError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(code) if *code == SqlState::DISK_FULL || *code == SqlState::OUT_OF_MEMORY => {
                LocalError::DiskFull
            }
            _ => LocalError::Unknown(err.to_string()),
        }
    }
}
