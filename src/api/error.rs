use std::fmt;

use thiserror::Error;

/// Category of a failed data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataErrorKind {
    InvalidName,
    InvalidParameters,
    Unauthorized,
    NotFound,
    AlreadyExists,
    /// Unexpected HTTP status from the server.
    Server(u16),
    /// The request never got a response.
    Transport,
    /// The response body was not what we expected.
    Decode,
}

impl fmt::Display for DataErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataErrorKind::InvalidName => f.write_str("invalid name"),
            DataErrorKind::InvalidParameters => f.write_str("invalid parameters"),
            DataErrorKind::Unauthorized => f.write_str("unauthorized"),
            DataErrorKind::NotFound => f.write_str("not found"),
            DataErrorKind::AlreadyExists => f.write_str("already exists"),
            DataErrorKind::Server(status) => write!(f, "server error {}", status),
            DataErrorKind::Transport => f.write_str("transport error"),
            DataErrorKind::Decode => f.write_str("decode error"),
        }
    }
}

/// Error returned by every data operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DataError {
    pub kind: DataErrorKind,
    pub message: String,
}

impl DataError {
    pub fn new(kind: DataErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn server(status: u16) -> Self {
        Self::new(DataErrorKind::Server(status), format!("Server returned code {}", status))
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(DataErrorKind::Decode, message)
    }

    pub fn is(&self, kind: DataErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::new(DataErrorKind::Transport, err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

pub type DataResult<T> = Result<T, DataError>;
