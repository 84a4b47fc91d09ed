//! reqwest implementation of [`PortalApi`]

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use fwgate_core::{Credentials, DownloadItem, DownloadKind, Error, HttpOptions, Result};

use crate::api::{AuthToken, PortalApi, SignInOutcome, TwoFactorChallenge, VerifyMethod};

/// Public developer-portal endpoint
pub const DEFAULT_PORTAL_URL: &str = "https://developer.apple.com/services-account/v1/";

#[derive(Serialize)]
struct SignInRequest<'a> {
    #[serde(rename = "accountName")]
    account_name: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SmsRequest<'a> {
    session: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_id: Option<u32>,
    mode: &'static str,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    session: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_id: Option<u32>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Developer-portal REST client
#[derive(Debug, Clone)]
pub struct HttpPortalApi {
    client: Client,
    base_url: Url,
}

impl HttpPortalApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, &HttpOptions::default())
    }

    /// Create a client with proxy/TLS/timeout options
    pub fn with_options(base_url: &str, options: &HttpOptions) -> Result<Self> {
        let client = options.build_client(true)?;
        Self::with_http_client(base_url, client)
    }

    /// Create a client around an existing reqwest client
    pub fn with_http_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = fwgate_core::base_url(base_url)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(Error::from)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Non-success status as an API error
fn unexpected(status: StatusCode) -> Error {
    Error::api(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error"),
    )
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignInOutcome> {
        let url = self.url("signin")?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&SignInRequest {
                account_name: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: TokenResponse = Self::decode(response).await?;
                Ok(SignInOutcome::Authenticated(AuthToken::new(body.token)))
            }
            StatusCode::CONFLICT => {
                let challenge: TwoFactorChallenge = Self::decode(response).await?;
                debug!("Two-factor verification required");
                Ok(SignInOutcome::TwoFactorRequired(challenge))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Auth(
                "portal rejected username or password".into(),
            )),
            status => Err(unexpected(status)),
        }
    }

    #[instrument(skip(self, challenge))]
    async fn request_sms_code(&self, challenge: &TwoFactorChallenge) -> Result<()> {
        let url = self.url("verify/phone")?;
        debug!("PUT {}", url);

        let response = self
            .client
            .put(url)
            .json(&SmsRequest {
                session: &challenge.session,
                phone_id: challenge.trusted_phone_id,
                mode: "sms",
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(unexpected(status))
        }
    }

    #[instrument(skip(self, challenge, code))]
    async fn verify_code(
        &self,
        challenge: &TwoFactorChallenge,
        method: VerifyMethod,
        code: &str,
    ) -> Result<AuthToken> {
        let url = self.url(&format!("verify/{}/securitycode", method.as_path()))?;
        debug!("POST {}", url);

        let phone_id = match method {
            VerifyMethod::Phone => challenge.trusted_phone_id,
            VerifyMethod::TrustedDevice => None,
        };
        let response = self
            .client
            .post(url)
            .json(&VerifyRequest {
                session: &challenge.session,
                code,
                phone_id,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: TokenResponse = Self::decode(response).await?;
                Ok(AuthToken::new(body.token))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::Auth("portal rejected verification code".into()))
            }
            status => Err(unexpected(status)),
        }
    }

    #[instrument(skip(self, token))]
    async fn list_downloads(
        &self,
        token: &AuthToken,
        kind: DownloadKind,
    ) -> Result<Vec<DownloadItem>> {
        let url = self.url(&format!("downloads/{}", kind))?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Self::decode(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::Auth("portal session expired".into()))
            }
            status => Err(unexpected(status)),
        }
    }
}
