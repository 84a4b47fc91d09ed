//! Portal session lifecycle

use serde::{Deserialize, Serialize};

/// State of a developer-portal session
///
/// ```text
/// New ──login()──▶ LoggedIn ──▶ Watching | Listing | Downloading
///                     ▲                     │
///                     └─────────────────────┘
///                  LoggedIn ──close()──▶ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    New,
    LoggedIn,
    Watching,
    Listing,
    Downloading,
    Closed,
}

impl SessionState {
    /// Whether the session holds an authenticated identity
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self,
            SessionState::LoggedIn
                | SessionState::Watching
                | SessionState::Listing
                | SessionState::Downloading
        )
    }
}
