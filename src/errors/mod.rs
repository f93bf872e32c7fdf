//! # Error Handling
//!
//! Error types for dyncert, built on `thiserror`. Certificate-level failures
//! live in [`TlsError`]; [`Error`] wraps them together with configuration,
//! I/O and serialization failures for the binary and config loaders.

pub mod tls;

pub use tls::TlsError;

/// Custom result type for dyncert operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dyncert
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Certificate errors
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
