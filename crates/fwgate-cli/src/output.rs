//! Output formatting for fwgate (table, json)

use std::str::FromStr;

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use fwgate_core::{Device, Firmware};
use fwgate_traits::DeviceRecord;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| format!("Unknown output format: {}. Valid formats: table, json", s))
    }
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print rows as a table, or `json` as JSON
    pub fn print<T: Tabled, J: Serialize + ?Sized>(&self, rows: &[T], json: &J) {
        match self.format {
            OutputFormat::Table => {
                if rows.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(rows));
                }
            }
            OutputFormat::Json => print_json(json),
        }
    }

    /// Print key-value pairs, or `json` as JSON
    pub fn print_kv<J: Serialize + ?Sized>(&self, pairs: &[(&str, String)], json: &J) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => print_json(json),
        }
    }

    /// Print a single scalar result (a version, a build id)
    pub fn print_value(&self, key: &str, value: &str) {
        match self.format {
            OutputFormat::Table => println!("{}", value),
            OutputFormat::Json => print_json(&serde_json::json!({ key: value })),
        }
    }
}

fn print_json<J: Serialize + ?Sized>(data: &J) {
    println!(
        "{}",
        serde_json::to_string_pretty(data).unwrap_or_else(|_| "null".to_string())
    );
}

/// Human-readable byte size
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1000.0 && unit < UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Device display for device list
#[derive(Debug, Tabled)]
pub struct DeviceRow {
    #[tabled(rename = "Identifier")]
    pub identifier: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Board")]
    pub board_config: String,
    #[tabled(rename = "CPID")]
    pub cpid: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            identifier: d.identifier.clone(),
            name: d.name.clone(),
            board_config: d.board_config.clone(),
            cpid: format!("{:#06x}", d.cpid),
        }
    }
}

/// Firmware display for ipsw and device commands
#[derive(Debug, Tabled)]
pub struct FirmwareRow {
    #[tabled(rename = "Device")]
    pub identifier: String,
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "Build")]
    pub build_id: String,
    #[tabled(rename = "Size")]
    pub size: String,
    #[tabled(rename = "Signed")]
    pub signed: String,
    #[tabled(rename = "Released")]
    pub released: String,
}

impl From<&Firmware> for FirmwareRow {
    fn from(f: &Firmware) -> Self {
        Self {
            identifier: f.identifier.clone(),
            version: f.version.clone(),
            build_id: f.build_id.clone(),
            size: format_size(f.file_size),
            signed: if f.signed { "yes" } else { "no" }.to_string(),
            released: f
                .release_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Device-trait display for traits commands
#[derive(Debug, Tabled)]
pub struct TraitRow {
    #[tabled(rename = "Product")]
    pub product_type: String,
    #[tabled(rename = "Target")]
    pub target: String,
    #[tabled(rename = "Description")]
    pub description: String,
    #[tabled(rename = "Arch")]
    pub architecture: String,
    #[tabled(rename = "Memory")]
    pub memory_class: String,
    #[tabled(rename = "GPU")]
    pub graphics: String,
}

impl From<&DeviceRecord> for TraitRow {
    fn from(d: &DeviceRecord) -> Self {
        Self {
            product_type: d.product_type.clone(),
            target: d.target.clone(),
            description: d.product_description.clone(),
            architecture: d.traits.preferred_architecture.clone(),
            memory_class: d.traits.device_performance_memory_class.to_string(),
            graphics: d.traits.graphics_feature_set_class.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1_500_000), "1.5 MB");
        assert_eq!(format_size(5_000_000_000), "5.0 GB");
    }

    #[test]
    fn test_firmware_row() {
        let fw = Firmware {
            identifier: "iPhone10,3".into(),
            version: "16.5".into(),
            build_id: "20F66".into(),
            file_size: 6_100_000_000,
            signed: true,
            ..Default::default()
        };
        let row = FirmwareRow::from(&fw);
        assert_eq!(row.signed, "yes");
        assert_eq!(row.size, "6.1 GB");
        assert!(row.released.is_empty());
    }
}
