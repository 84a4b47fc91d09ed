//! fwgate-core - Core types and capabilities for fwgate
//!
//! This crate holds the data model shared by the firmware-index client, the
//! device-trait resolver, the credential vault and the developer-portal
//! session, together with the error taxonomy they all report through and the
//! interactive prompt capability they are given at construction time.

pub mod error;
pub mod http;
pub mod models;
pub mod prompt;

pub use error::{Error, Result};
pub use http::{base_url, HttpOptions};
pub use models::*;
pub use prompt::{CredentialPrompt, PromptOutcome};
