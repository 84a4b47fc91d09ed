//! Developer-portal session
//!
//! Signs in to the developer portal (including two-factor verification),
//! then lists, watches and downloads items from its two catalog partitions.
//!
//! The wire protocol sits behind [`PortalApi`]; [`HttpPortalApi`] is the
//! reqwest implementation and [`testing::MockPortal`] a scripted one.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fwgate_core::{CredentialPrompt, Credentials, DownloadKind};
//! use fwgate_portal::{HttpPortalApi, PortalSession, SessionConfig, DEFAULT_PORTAL_URL};
//!
//! # async fn run(prompt: &dyn CredentialPrompt) -> fwgate_core::Result<()> {
//! let api = Arc::new(HttpPortalApi::new(DEFAULT_PORTAL_URL)?);
//! let session = PortalSession::new(api, SessionConfig::default());
//!
//! session.login(&Credentials::new("dev@example.com", "hunter2"), prompt).await?;
//! let json = session.list_downloads_as_json(DownloadKind::More, true).await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod http;
mod session;
pub mod testing;

pub use api::{AuthToken, DownloadExecutor, PortalApi, SignInOutcome, TwoFactorChallenge, VerifyMethod};
pub use http::{HttpPortalApi, DEFAULT_PORTAL_URL};
pub use session::{PortalSession, SessionConfig, DEFAULT_PAGE_SIZE, DEFAULT_WATCH_INTERVAL};

pub use fwgate_core::{DownloadItem, DownloadKind, Error, Result, SessionState};
