//! Error types

use thiserror::Error;

/// Errors from fetching the channel or stream directory
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("IPTV request failed ({0})")]
    Status(u16),

    /// Connection, TLS or read failure
    #[error("IPTV request failed: {0}")]
    Transport(String),

    /// Body was not the expected JSON array
    #[error("IPTV response malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The cycle's cancel token fired; not a real failure
    #[error("IPTV request aborted")]
    Aborted,
}

impl FetchError {
    pub fn is_abort(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) => FetchError::Status(code),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

/// Errors from reading or writing the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
