//! Firmware-index client
//!
//! Typed access to an ipsw.me v4 compatible firmware index: the device
//! catalog, per-device firmware lists and version/build cross-referencing.
//!
//! # Example
//!
//! ```rust,no_run
//! use fwgate_index::MetadataClient;
//!
//! #[tokio::main]
//! async fn main() -> fwgate_core::Result<()> {
//!     let client = MetadataClient::new(fwgate_index::DEFAULT_INDEX_URL)?;
//!
//!     // Every firmware image Apple published for one device
//!     let firmwares = client.get_device_firmwares("iPhone10,3").await?;
//!
//!     // Translate a build to its marketing version
//!     let version = client.resolve_version_from_build("20F66").await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module serves an axum router in-process and hands back a
//! client pointed at it:
//!
//! ```rust,ignore
//! use fwgate_index::testing::TestServer;
//!
//! let server = TestServer::start(router).await?;
//! let devices = server.client.list_devices().await?;
//! ```

mod client;
pub mod testing;

pub use client::{MetadataClient, DEFAULT_INDEX_URL};

// Re-export core types for convenience
pub use fwgate_core::{Device, Error, Firmware, HttpOptions, Result};
