use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable description of the failure.
        message: String,
        /// Backend specific cause.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A uniqueness constraint was violated (e.g. an e-mail already registered).
    #[error("duplicate record: {message}")]
    Duplicate {
        /// Which constraint was violated.
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a uniqueness violation error.
    pub fn duplicate(message: impl Into<String>) -> Self {
        StorageError::Duplicate {
            message: message.into(),
        }
    }
}
