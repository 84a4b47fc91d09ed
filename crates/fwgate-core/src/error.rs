//! Error taxonomy shared by every fwgate component

use thiserror::Error;

/// Result type for fwgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving metadata, unlocking the vault or
/// talking to the developer portal
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure (connect, TLS, body read). Potentially transient.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote service answered with a non-success status
    #[error("api returned status: {status} {message}")]
    Api { status: u16, message: String },

    /// Payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Resolution failed after exhausting the search space
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials rejected by the portal. Terminal for the run.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Vault password is wrong or the vault file is corrupt
    #[error("Failed to decrypt vault: {0}")]
    Decrypt(String),

    /// Local filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation requires a logged-in portal session
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// The user cancelled an interactive prompt
    #[error("Cancelled by user")]
    Cancelled,

    /// Invalid configuration or argument
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create an API error from status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by an [`Error::Api`], if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller may reasonably retry the same request later
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
            || matches!(self, Error::Api { status, .. } if *status >= 500)
    }

    /// Whether this error came from the user backing out of a prompt
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

/// Body decode failures are payload problems; everything else happened on
/// the wire
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::api(404, "Not Found");
        assert_eq!(err.to_string(), "api returned status: 404 Not Found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::Transport("reset".into()).is_transient());
        assert!(Error::api(503, "unavailable").is_transient());
        assert!(!Error::api(404, "missing").is_transient());
        assert!(!Error::Auth("bad password".into()).is_transient());
        assert!(!Error::Decrypt("tag mismatch".into()).is_transient());
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err: Error = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert!(matches!(err, Error::Decode(_)));
    }
}
