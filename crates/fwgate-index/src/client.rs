//! Firmware-index HTTP client implementation

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;

use fwgate_core::{Device, Error, Firmware, HttpOptions, Result};


/// Public ipsw.me v4 endpoint
pub const DEFAULT_INDEX_URL: &str = "https://api.ipsw.me/v4/";

/// Firmware-index REST client
///
/// Stateless: every call is one or more request/response round trips issued
/// strictly one after another. Non-200 answers are hard failures; nothing is
/// retried.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: Client,
    base_url: Url,
}

impl MetadataClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the index (e.g., "https://api.ipsw.me/v4/")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, &HttpOptions::default())
    }

    /// Create a new client with proxy/TLS/timeout options
    pub fn with_options(base_url: &str, options: &HttpOptions) -> Result<Self> {
        let client = options.build_client(true)?;
        Self::with_http_client(base_url, client)
    }

    /// Create a client around an existing reqwest client
    pub fn with_http_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = fwgate_core::base_url(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // Devices
    // =========================================================================

    /// Fetch the full device catalog, in index order
    #[instrument(skip(self))]
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        self.get_json("devices").await
    }

    /// Fetch one device and its firmware list
    ///
    /// An unknown identifier surfaces as `Error::Api { status: 404, .. }`.
    #[instrument(skip(self))]
    pub async fn get_device(&self, identifier: &str) -> Result<Device> {
        self.get_json(&format!("device/{}", identifier)).await
    }

    /// Firmware images for one device
    #[instrument(skip(self))]
    pub async fn get_device_firmwares(&self, identifier: &str) -> Result<Vec<Firmware>> {
        self.get_device(identifier).await.map(|d| d.firmwares)
    }

    // =========================================================================
    // Firmwares
    // =========================================================================

    /// All firmware images, across devices, for a version string
    #[instrument(skip(self))]
    pub async fn list_firmwares_for_version(&self, version: &str) -> Result<Vec<Firmware>> {
        self.get_json(&format!("ipsw/{}", version)).await
    }

    /// A single firmware image by device identifier and build ID
    #[instrument(skip(self))]
    pub async fn get_firmware(&self, identifier: &str, build_id: &str) -> Result<Firmware> {
        self.get_json(&format!("ipsw/{}/{}", identifier, build_id))
            .await
    }

    // =========================================================================
    // Cross-referencing
    // =========================================================================

    /// Resolve the marketing version for a build ID
    ///
    /// The index has no build lookup, so this walks the device catalog in
    /// reverse order (newest devices are catalogued last), fetching each
    /// device in turn until one carries a firmware with the build. Requests
    /// are sequential and each device is re-fetched individually even though
    /// the catalog listing may already embed firmware arrays.
    #[instrument(skip(self))]
    pub async fn resolve_version_from_build(&self, build_id: &str) -> Result<String> {
        let devices = self.list_devices().await?;
        debug!(
            devices = devices.len(),
            "Scanning catalog for build {}", build_id
        );

        for summary in devices.iter().rev() {
            let device = self.get_device(&summary.identifier).await?;
            if let Some(fw) = device.firmware_for_build(build_id) {
                info!(
                    device = %device.identifier,
                    version = %fw.version,
                    "Resolved build {}", build_id
                );
                return Ok(fw.version.clone());
            }
        }

        Err(Error::NotFound(format!(
            "no version found for build {} after scanning {} devices",
            build_id,
            devices.len()
        )))
    }

    /// Resolve the build ID of `version` for one device
    #[instrument(skip(self))]
    pub async fn resolve_build_from_version(
        &self,
        version: &str,
        identifier: &str,
    ) -> Result<String> {
        let firmwares = self.list_firmwares_for_version(version).await?;

        firmwares
            .into_iter()
            .find(|fw| fw.identifier == identifier)
            .map(|fw| fw.build_id)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no build found for version {} and device {}",
                    version, identifier
                ))
            })
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Handle response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status != StatusCode::OK {
            return Err(Error::api(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| Error::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = MetadataClient::new(DEFAULT_INDEX_URL);
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = MetadataClient::new("not a url");
        assert!(matches!(client, Err(Error::Config(_))));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = MetadataClient::new("http://localhost:9080/v4").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:9080/v4/");
        assert_eq!(
            client.base_url().join("device/iPhone10,3").unwrap().as_str(),
            "http://localhost:9080/v4/device/iPhone10,3"
        );
    }
}
