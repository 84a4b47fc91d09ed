//! Transport options shared by every HTTP-speaking component

use std::time::Duration;

use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How HTTP clients should reach the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOptions {
    /// Proxy URL applied to all schemes
    #[serde(default)]
    pub proxy: Option<String>,
    /// Accept invalid TLS certificates
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
    #[serde(default = "default_connect_timeout", with = "duration_secs")]
    pub connect_timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            insecure: false,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl HttpOptions {
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }
}

impl HttpOptions {
    /// Build a reqwest client honoring proxy, TLS and timeout settings
    ///
    /// `request_timeout` bounds whole requests; streaming downloads leave it
    /// off and only keep the connect timeout.
    pub fn build_client(&self, request_timeout: bool) -> Result<Client> {
        let mut builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .danger_accept_invalid_certs(self.insecure);
        if request_timeout {
            builder = builder.timeout(self.timeout);
        }

        if let Some(proxy) = self.proxy.as_deref().filter(|p| !p.is_empty()) {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}

/// Parse a service base URL so relative joins keep its last path segment
pub fn base_url(url: &str) -> Result<Url> {
    if url.ends_with('/') {
        Ok(Url::parse(url)?)
    } else {
        Ok(Url::parse(&format!("{}/", url))?)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = base_url("http://localhost:9080/v4").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9080/v4/");
        assert_eq!(
            url.join("device/iPhone10,3").unwrap().as_str(),
            "http://localhost:9080/v4/device/iPhone10,3"
        );
        assert_eq!(base_url("http://localhost/a/").unwrap().as_str(), "http://localhost/a/");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        assert!(matches!(base_url("not a url"), Err(Error::Config(_))));
    }

    #[test]
    fn test_build_client_rejects_bad_proxy() {
        let options = HttpOptions::default().with_proxy("::not a proxy::");
        assert!(matches!(options.build_client(true), Err(Error::Config(_))));
        assert!(HttpOptions::default().build_client(false).is_ok());
    }
}
