//! Where the compressed trait dataset comes from

use std::path::{Path, PathBuf};

use fwgate_core::Result;

/// Dataset compiled into the binary
static EMBEDDED_DATASET: &[u8] = include_bytes!("../data/device_traits.gz");

/// Supplier of the gzip-compressed JSON trait dataset
pub trait TraitSource: Send + Sync {
    /// Human-readable origin, used in log and error messages
    fn describe(&self) -> String;

    /// Raw compressed bytes
    fn read(&self) -> Result<Vec<u8>>;
}

/// The dataset shipped with fwgate
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTraits;

impl TraitSource for EmbeddedTraits {
    fn describe(&self) -> String {
        "embedded device_traits.gz".to_string()
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(EMBEDDED_DATASET.to_vec())
    }
}

/// A dataset file on disk, same format as the embedded one
#[derive(Debug, Clone)]
pub struct FileTraits {
    path: PathBuf,
}

impl FileTraits {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraitSource for FileTraits {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_dataset_is_gzip() {
        let bytes = EmbeddedTraits.read().unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = FileTraits::new("/nonexistent/device_traits.gz");
        assert!(matches!(source.read(), Err(fwgate_core::Error::Io(_))));
        assert_eq!(source.describe(), "/nonexistent/device_traits.gz");
    }
}
