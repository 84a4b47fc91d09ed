//! Device-trait records as stored in the dataset

use serde::{Deserialize, Serialize};

/// One target device and its traits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
    /// Board target (e.g., "d22ap")
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_type: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_variant: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub platform: String,

    /// Marketing product type (e.g., "iPhone10,3")
    #[serde(skip_serializing_if = "String::is_empty")]
    pub product_type: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub product_description: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub compatible_device_fallback: String,

    pub traits: DeviceTrait,

    /// Dataset-internal trait set id, never written out
    #[serde(skip)]
    pub trait_set: u32,
}

/// Hardware traits shared by one or more device records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceTrait {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub preferred_architecture: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub artwork_device_idiom: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub artwork_hosted_idioms: String,

    #[serde(skip_serializing_if = "is_zero")]
    pub artwork_scale_factor: u32,

    #[serde(skip_serializing_if = "is_zero")]
    pub artwork_device_subtype: u32,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub artwork_display_gamut: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub artwork_dynamic_display_mode: String,

    #[serde(skip_serializing_if = "is_zero")]
    pub device_performance_memory_class: u32,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub graphics_feature_set_class: String,

    /// Colon-separated list, best first
    #[serde(skip_serializing_if = "String::is_empty")]
    pub graphics_feature_set_fallbacks: String,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl DeviceTrait {
    /// Graphics feature set fallbacks as individual entries
    pub fn fallbacks(&self) -> impl Iterator<Item = &str> {
        self.graphics_feature_set_fallbacks
            .split(':')
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sparse_record() {
        let json = r#"{
            "target": "n121bap",
            "product_type": "Watch3,4",
            "traits": {"preferred_architecture": "armv7k", "artwork_scale_factor": 2}
        }"#;
        let record: DeviceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.target, "n121bap");
        assert!(record.target_variant.is_empty());
        assert_eq!(record.traits.artwork_scale_factor, 2);
        assert_eq!(record.traits.device_performance_memory_class, 0);
    }

    #[test]
    fn test_trait_set_not_serialized() {
        let record = DeviceRecord {
            target: "d22ap".into(),
            trait_set: 42,
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("trait_set").is_none());
        assert!(json.get("target_variant").is_none());
        assert_eq!(json["target"], "d22ap");
    }

    #[test]
    fn test_fallbacks() {
        let traits = DeviceTrait {
            graphics_feature_set_fallbacks: "MTL3,2:MTL3,1:GLES3,0".into(),
            ..Default::default()
        };
        let fallbacks: Vec<&str> = traits.fallbacks().collect();
        assert_eq!(fallbacks, vec!["MTL3,2", "MTL3,1", "GLES3,0"]);
        assert_eq!(DeviceTrait::default().fallbacks().count(), 0);
    }
}
