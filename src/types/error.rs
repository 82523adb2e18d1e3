use thiserror::Error;

/// daybrief error types
#[derive(Error, Debug)]
pub enum DaybriefError {
    /// Upstream fetch failed (network, timeout, non-2xx)
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Failed to parse a timestamp or response body
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for daybrief
pub type Result<T> = std::result::Result<T, DaybriefError>;
