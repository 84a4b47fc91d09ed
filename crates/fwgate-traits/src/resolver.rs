//! Device-trait lookups
//!
//! Every call decompresses and decodes the dataset again. Nothing is cached.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use fwgate_core::{Error, Result};

use crate::record::DeviceRecord;
use crate::source::{EmbeddedTraits, FileTraits, TraitSource};

/// Resolves device records from a trait dataset
#[derive(Clone)]
pub struct DeviceTraitResolver {
    source: Arc<dyn TraitSource>,
}

impl std::fmt::Debug for DeviceTraitResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceTraitResolver")
            .field("source", &self.source.describe())
            .finish()
    }
}

impl Default for DeviceTraitResolver {
    fn default() -> Self {
        Self::embedded()
    }
}

impl DeviceTraitResolver {
    /// Resolver over the dataset compiled into the binary
    pub fn embedded() -> Self {
        Self::with_source(EmbeddedTraits)
    }

    /// Resolver over a gzip dataset file
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::with_source(FileTraits::new(path.as_ref()))
    }

    pub fn with_source(source: impl TraitSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Every record in dataset order
    #[instrument(skip(self), fields(source = %self.source.describe()))]
    pub fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        let compressed = self.source.read()?;
        let devices: Vec<DeviceRecord> = serde_json::from_reader(GzDecoder::new(&compressed[..]))
            .map_err(|e| {
                Error::Decode(format!(
                    "failed unmarshaling {} data: {}",
                    self.source.describe(),
                    e
                ))
            })?;

        debug!(count = devices.len(), "Loaded device traits");
        Ok(devices)
    }

    /// First record whose product type matches exactly (e.g., "iPhone10,3")
    pub fn find_by_product_type(&self, product_type: &str) -> Result<DeviceRecord> {
        self.list_devices()?
            .into_iter()
            .find(|d| d.product_type == product_type)
            .ok_or_else(|| {
                Error::NotFound(format!("device not found for product type {}", product_type))
            })
    }

    /// First record whose board target matches exactly (e.g., "d22ap")
    pub fn find_by_model(&self, model: &str) -> Result<DeviceRecord> {
        self.list_devices()?
            .into_iter()
            .find(|d| d.target == model)
            .ok_or_else(|| Error::NotFound(format!("device not found for model {}", model)))
    }

    /// Write records as a JSON array to `path`
    ///
    /// The data goes to a temporary file next to `path` which is then renamed
    /// over it, so `path` either keeps its old content or gets the complete
    /// new one.
    #[instrument(skip(devices), fields(count = devices.len()))]
    pub fn export_json(devices: &[DeviceRecord], path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, devices)?;
        tmp.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o660))?;
        }

        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        debug!(path = %path.display(), "Exported device traits");
        Ok(())
    }
}
