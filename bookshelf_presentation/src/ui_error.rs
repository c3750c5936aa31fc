use bookshelf_repository::error::{DataError, LocalError, RemoteError};

/// Error as presented to the user
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiError {
    #[error("The request timed out.")]
    RequestTimeout,
    #[error("Whoops, seems like your quota is exceeded.")]
    TooManyRequests,
    #[error("Couldn't reach server, please check your internet connection.")]
    NoInternet,
    #[error("Something went wrong. Please try again later.")]
    ServerError,
    #[error("Couldn't parse data.")]
    Serialization,
    #[error("Oops, something went wrong.")]
    Unknown,
    #[error("It looks like your disk is full.")]
    DiskFull,
}

impl From<&RemoteError> for UiError {
    fn from(err: &RemoteError) -> Self {
        match err {
            RemoteError::RequestTimeout => UiError::RequestTimeout,
            RemoteError::TooManyRequests => UiError::TooManyRequests,
            RemoteError::NoInternet => UiError::NoInternet,
            RemoteError::ServerError => UiError::ServerError,
            RemoteError::Serialization => UiError::Serialization,
            RemoteError::Unknown => UiError::Unknown,
        }
    }
}

impl From<&LocalError> for UiError {
    fn from(err: &LocalError) -> Self {
        match err {
            LocalError::DiskFull => UiError::DiskFull,
            LocalError::Malformed(_) | LocalError::Unknown(_) => UiError::Unknown,
        }
    }
}

impl From<&DataError> for UiError {
    fn from(err: &DataError) -> Self {
        match err {
            DataError::Remote(err) => err.into(),
            DataError::Local(err) => err.into(),
        }
    }
}
