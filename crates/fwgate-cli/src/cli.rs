//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "fwgate")]
#[command(author, version, about = "Apple firmware metadata and developer-portal downloads")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FWGATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// HTTP proxy for all requests
    #[arg(long, env = "FWGATE_PROXY", global = true)]
    pub proxy: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Firmware-index base URL
    #[arg(long, env = "FWGATE_INDEX_URL", global = true)]
    pub index_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download OS images (and more) from the developer portal
    Dev(DevArgs),

    /// Query the firmware-index device catalog
    Device {
        #[command(subcommand)]
        command: DeviceCommand,
    },

    /// Query firmware images
    Ipsw {
        #[command(subcommand)]
        command: IpswCommand,
    },

    /// Translate between versions and build ids
    Resolve {
        #[command(subcommand)]
        command: ResolveCommand,
    },

    /// Look up device traits in the embedded dataset
    Traits {
        /// Read traits from this gzip dataset instead of the embedded one
        #[arg(long, env = "FWGATE_TRAITS_FILE")]
        dataset: Option<PathBuf>,

        #[command(subcommand)]
        command: TraitsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// List every device in the catalog
    List,

    /// Show one device and its firmwares
    Get {
        /// Device identifier (e.g., iPhone10,3)
        identifier: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum IpswCommand {
    /// List firmwares of one version across devices
    Version {
        /// Marketing version (e.g., 16.5)
        #[arg(value_name = "VERSION")]
        os_version: String,
    },

    /// Show one firmware
    Get {
        /// Device identifier (e.g., iPhone10,3)
        identifier: String,

        /// Build id (e.g., 20F66)
        build: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ResolveCommand {
    /// Find the version of a build id
    Version {
        /// Build id (e.g., 20F66)
        build: String,
    },

    /// Find the build id of a version on a device
    Build {
        /// Marketing version (e.g., 16.5)
        #[arg(value_name = "VERSION")]
        os_version: String,

        /// Device identifier (e.g., iPhone10,3)
        identifier: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TraitsCommand {
    /// List all device records
    List {
        /// Order by product type
        #[arg(long)]
        sorted: bool,
    },

    /// Look up a device by product type
    Prod {
        /// Product type (e.g., iPhone10,3)
        product_type: String,
    },

    /// Look up a device by board target
    Model {
        /// Board target (e.g., d22ap)
        model: String,
    },

    /// Write all device records to a JSON file
    Export {
        /// Destination file
        path: PathBuf,

        /// Order by product type
        #[arg(long)]
        sorted: bool,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct DevArgs {
    /// Watch for new items whose title or category contains TERM (repeatable)
    #[arg(short, long = "watch", value_name = "TERM")]
    pub watch: Vec<String>,

    /// Seconds between watch polls
    #[arg(long, value_name = "SECS")]
    pub watch_interval: Option<u64>,

    /// Use the "more" catalog (Xcode, KDKs, ...) without asking
    #[arg(short, long)]
    pub more: bool,

    /// Items per page in the download selection
    #[arg(short, long)]
    pub page: Option<usize>,

    /// Request two-factor codes by SMS
    #[arg(long)]
    pub sms: bool,

    /// Print the catalog as JSON instead of downloading
    #[arg(long)]
    pub json: bool,

    /// Indent JSON output
    #[arg(long, requires = "json")]
    pub pretty: bool,

    /// Directory for JSON listings and downloads
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Vault password (skips the prompt)
    #[arg(short = 'k', long, env = "FWGATE_VAULT_PASSWORD", hide_env_values = true)]
    pub vault_password: Option<String>,

    /// Vault file location
    #[arg(long, env = "FWGATE_VAULT_PATH")]
    pub vault_path: Option<PathBuf>,

    /// Developer-portal username
    #[arg(short, long, env = "FWGATE_USERNAME")]
    pub username: Option<String>,

    /// Developer-portal password
    #[arg(long, env = "FWGATE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Developer-portal base URL
    #[arg(long, env = "FWGATE_PORTAL_URL")]
    pub portal_url: Option<String>,

    /// Ask before each download
    #[arg(long)]
    pub confirm: bool,

    /// Skip files that already exist
    #[arg(long, conflicts_with_all = ["resume_all", "restart_all"])]
    pub skip_all: bool,

    /// Resume partial files without asking
    #[arg(long, conflicts_with = "restart_all")]
    pub resume_all: bool,

    /// Restart partial files without asking
    #[arg(long)]
    pub restart_all: bool,

    /// Strip commas from downloaded file names
    #[arg(long)]
    pub remove_commas: bool,
}
