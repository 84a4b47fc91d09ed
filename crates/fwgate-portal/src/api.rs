//! PortalApi trait - the transport seam of the portal session

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use fwgate_core::{Credentials, DownloadItem, DownloadKind, Result};

/// Bearer token issued by the portal after a successful sign-in
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Pending two-factor verification returned by a sign-in attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoFactorChallenge {
    /// Opaque id tying the verification to the sign-in attempt
    pub session: String,
    /// Trusted phone to send SMS codes to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_phone_id: Option<u32>,
    /// Masked phone number, for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Result of submitting username and password
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Authenticated(AuthToken),
    TwoFactorRequired(TwoFactorChallenge),
}

/// Where the two-factor code was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMethod {
    /// Pushed to a trusted device
    TrustedDevice,
    /// Sent by SMS to a trusted phone
    Phone,
}

impl VerifyMethod {
    pub fn as_path(&self) -> &'static str {
        match self {
            VerifyMethod::TrustedDevice => "trusteddevice",
            VerifyMethod::Phone => "phone",
        }
    }
}

/// Developer-portal operations
///
/// Implementations translate rejected credentials or codes into
/// `Error::Auth` and never retry on their own.
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignInOutcome>;

    /// Ask the portal to text a verification code to the trusted phone
    async fn request_sms_code(&self, challenge: &TwoFactorChallenge) -> Result<()>;

    async fn verify_code(
        &self,
        challenge: &TwoFactorChallenge,
        method: VerifyMethod,
        code: &str,
    ) -> Result<AuthToken>;

    /// One catalog partition, in whatever order the portal returns it
    async fn list_downloads(&self, token: &AuthToken, kind: DownloadKind)
        -> Result<Vec<DownloadItem>>;
}

/// Fetches the files behind selected catalog items
#[async_trait]
pub trait DownloadExecutor: Send + Sync {
    async fn download(&self, token: &AuthToken, items: &[DownloadItem]) -> Result<()>;
}
