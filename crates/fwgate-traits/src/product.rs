//! Product type parsing and ordering

use std::fmt;

use crate::record::DeviceRecord;

/// A product type split into family and version numbers
///
/// `"iPhone10,1"` becomes `("iPhone", 10, 1)`. Missing or non-numeric parts
/// parse as zero so every record has a sort position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductType {
    pub family: String,
    pub major: u32,
    pub minor: u32,
}

impl ProductType {
    pub fn parse(product_type: &str) -> Self {
        let split = product_type
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(product_type.len());
        let (family, numbers) = product_type.split_at(split);
        let (major, minor) = numbers.split_once(',').unwrap_or((numbers, ""));

        Self {
            family: family.to_string(),
            major: major.trim().parse().unwrap_or(0),
            minor: minor.trim().parse().unwrap_or(0),
        }
    }

    /// Zero-padded key so that "iPhone9,2" sorts before "iPhone10,1"
    pub fn sort_key(&self) -> String {
        format!("{}{:02}{:02}", self.family, self.major, self.minor)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{},{}", self.family, self.major, self.minor)
    }
}

/// Stable sort of device records by product type
pub fn sort_by_product_type(devices: &mut [DeviceRecord]) {
    devices.sort_by_cached_key(|d| ProductType::parse(&d.product_type).sort_key());
}
