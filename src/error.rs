//! Error types for DrishtiIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DrishtiIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No frame buffer currently available from the source
    #[error("No frame available")]
    FrameUnavailable,

    /// Device initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Malformed or unsupported HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown camera source type in configuration
    #[error("Unknown camera source: {0}")]
    UnknownSource(String),

    /// Unknown flash pin backend in configuration
    #[error("Unknown flash backend: {0}")]
    UnknownBackend(String),

    /// Frame encoding error
    #[error("Encode error: {0}")]
    Encode(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
