use thiserror::Error;

/// Statusboard engine errors
///
/// The analytics pipeline itself never fails on malformed elements; these
/// errors only surface at the boundaries (decoding a response document,
/// parsing a status string, loading or validating configuration).
#[derive(Error, Debug)]
pub enum StatusboardError {
    /// A status string that is not one of the canonical presence states
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response document could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl StatusboardError {
    /// Create a new InvalidStatus error
    pub fn invalid_status<S: Into<String>>(status: S) -> Self {
        Self::InvalidStatus(status.into())
    }

    /// Create a new Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for statusboard operations
pub type Result<T> = std::result::Result<T, StatusboardError>;
