//! Error types for the terrain crate.

use std::fmt;

/// Result type for terrain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in terrain operations.
#[derive(Debug)]
pub enum Error {
    /// A caller-supplied argument violated a precondition.
    InvalidArgument {
        /// The operation or value that was rejected.
        context: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
    /// Heightmap payload decoding failed.
    Decode(terrain_decode::DecodeError),
    /// A mesh worker stopped before answering its request.
    Worker {
        /// The error message.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument { context, detail } => {
                write!(f, "invalid {context}: {detail}")
            }
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::Worker { message } => write!(f, "mesh worker failed: {message}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<terrain_decode::DecodeError> for Error {
    fn from(e: terrain_decode::DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(e: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::Worker {
            message: e.to_string(),
        }
    }
}
