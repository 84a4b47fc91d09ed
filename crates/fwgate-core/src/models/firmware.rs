//! Firmware-index models (devices and their firmware images)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A device known to the firmware index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Marketing name, e.g. "iPhone X (Global)"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Product type identifier, unique per catalog, e.g. "iPhone10,3"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub identifier: String,
    /// Board configuration, e.g. "d22ap"
    #[serde(default, rename = "boardconfig", skip_serializing_if = "String::is_empty")]
    pub board_config: String,
    /// Platform (SoC) name, e.g. "t8015"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub platform: String,
    /// Chip ID
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cpid: u32,
    /// Board ID
    #[serde(default, skip_serializing_if = "is_zero")]
    pub bdid: u32,
    /// Firmware images, in the order the index returned them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub firmwares: Vec<Firmware>,
}

impl Device {
    /// Find the firmware with the given build ID
    pub fn firmware_for_build(&self, build_id: &str) -> Option<&Firmware> {
        self.firmwares.iter().find(|fw| fw.build_id == build_id)
    }
}

/// A single firmware image (IPSW) for one device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firmware {
    /// Identifier of the device this image belongs to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub identifier: String,
    /// Marketing version, e.g. "16.5"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Build identifier, e.g. "20F66"
    #[serde(default, rename = "buildid", skip_serializing_if = "String::is_empty")]
    pub build_id: String,
    #[serde(default, rename = "sha1sum", skip_serializing_if = "String::is_empty")]
    pub sha1: String,
    #[serde(default, rename = "md5sum", skip_serializing_if = "String::is_empty")]
    pub md5: String,
    /// Size in bytes
    #[serde(default, rename = "filesize", skip_serializing_if = "is_zero_u64")]
    pub file_size: u64,
    /// Download URL
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, rename = "releasedate", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "uploaddate", skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,
    /// Whether Apple is still signing this image
    #[serde(default, skip_serializing_if = "is_false")]
    pub signed: bool,
}
