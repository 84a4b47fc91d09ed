//! Configuration file handling and settings resolution

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use fwgate_core::{DownloadKind, HttpOptions};
use fwgate_index::DEFAULT_INDEX_URL;
use fwgate_portal::{DEFAULT_PAGE_SIZE, DEFAULT_PORTAL_URL, DEFAULT_WATCH_INTERVAL};
use fwgate_vault::{default_vault_path, VaultConfig};

use crate::cli::{Cli, Commands, DevArgs};
use crate::output::OutputFormat;

/// Configuration file contents
///
/// Every field is optional; command-line flags win over file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format ("table" or "json")
    pub format: Option<String>,
    pub no_color: Option<bool>,
    pub proxy: Option<String>,
    pub insecure: Option<bool>,
    /// Request timeout in seconds
    pub timeout: Option<u64>,
    pub index_url: Option<String>,
    pub traits_file: Option<PathBuf>,
    pub dev: DevConfig,
}

/// `[dev]` table of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    pub portal_url: Option<String>,
    pub vault_path: Option<PathBuf>,
    pub username: Option<String>,
    pub page: Option<usize>,
    pub sms: Option<bool>,
    /// Seconds between watch polls
    pub watch_interval: Option<u64>,
    pub watch: Vec<String>,
    pub output: Option<PathBuf>,
    pub remove_commas: Option<bool>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("fwgate");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge command-line arguments over config file values
    pub fn merge_with_args(&self, cli: &Cli) -> Result<Settings> {
        let format = match (cli.format, self.format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(name)) => name.parse().map_err(anyhow::Error::msg)?,
            (None, None) => OutputFormat::default(),
        };

        let mut http = HttpOptions::default()
            .insecure(cli.insecure || self.insecure.unwrap_or(false));
        if let Some(proxy) = cli.proxy.clone().or_else(|| self.proxy.clone()) {
            http = http.with_proxy(proxy);
        }
        if let Some(secs) = self.timeout {
            http.timeout = Duration::from_secs(secs);
        }

        let traits_file = match &cli.command {
            Commands::Traits { dataset, .. } => dataset.clone(),
            _ => None,
        }
        .or_else(|| self.traits_file.clone());

        let dev = match &cli.command {
            Commands::Dev(args) => self.dev.merge_with_args(args),
            _ => self.dev.merge_with_args(&DevArgs::default()),
        };

        Ok(Settings {
            format,
            no_color: cli.no_color || self.no_color.unwrap_or(false),
            quiet: cli.quiet,
            verbose: cli.verbose,
            http,
            index_url: cli
                .index_url
                .clone()
                .or_else(|| self.index_url.clone())
                .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string()),
            traits_file,
            dev,
        })
    }
}

impl DevConfig {
    fn merge_with_args(&self, args: &DevArgs) -> DevSettings {
        let existing = if args.skip_all {
            ExistingFileAction::Skip
        } else if args.resume_all {
            ExistingFileAction::Resume
        } else if args.restart_all {
            ExistingFileAction::Restart
        } else {
            ExistingFileAction::Ask
        };

        let mut vault = VaultConfig::new(
            args.vault_path
                .clone()
                .or_else(|| self.vault_path.clone())
                .unwrap_or_else(default_vault_path),
        );
        if let Some(password) = &args.vault_password {
            vault = vault.with_password(password.clone());
        }

        DevSettings {
            portal_url: args
                .portal_url
                .clone()
                .or_else(|| self.portal_url.clone())
                .unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string()),
            vault,
            username: args.username.clone().or_else(|| self.username.clone()),
            password: args.password.clone().map(Zeroizing::new),
            watch: if args.watch.is_empty() {
                self.watch.clone()
            } else {
                args.watch.clone()
            },
            watch_interval: args
                .watch_interval
                .or(self.watch_interval)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_WATCH_INTERVAL),
            kind: args.more.then_some(DownloadKind::More),
            page_size: args.page.or(self.page).unwrap_or(DEFAULT_PAGE_SIZE),
            prefer_sms: args.sms || self.sms.unwrap_or(false),
            json: args.json,
            pretty: args.pretty,
            output: args.output.clone().or_else(|| self.output.clone()),
            downloads: DownloadPolicy {
                confirm: args.confirm,
                existing,
                remove_commas: args.remove_commas || self.remove_commas.unwrap_or(false),
            },
        }
    }
}

/// Fully resolved settings, built once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub format: OutputFormat,
    pub no_color: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub http: HttpOptions,
    pub index_url: String,
    pub traits_file: Option<PathBuf>,
    pub dev: DevSettings,
}

/// Settings of the `dev` command
#[derive(Clone)]
pub struct DevSettings {
    pub portal_url: String,
    pub vault: VaultConfig,
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub watch: Vec<String>,
    pub watch_interval: Duration,
    /// Catalog to use without asking
    pub kind: Option<DownloadKind>,
    pub page_size: usize,
    pub prefer_sms: bool,
    pub json: bool,
    pub pretty: bool,
    pub output: Option<PathBuf>,
    pub downloads: DownloadPolicy,
}

impl std::fmt::Debug for DevSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevSettings")
            .field("portal_url", &self.portal_url)
            .field("vault", &self.vault)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("watch", &self.watch)
            .field("kind", &self.kind)
            .field("json", &self.json)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// What to do when a download target already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingFileAction {
    /// Ask for every file
    #[default]
    Ask,
    Skip,
    /// Continue from the current length
    Resume,
    /// Truncate and download again
    Restart,
}

/// How downloads are written
#[derive(Debug, Clone, Default)]
pub struct DownloadPolicy {
    /// Ask before each download
    pub confirm: bool,
    pub existing: ExistingFileAction,
    pub remove_commas: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fwgate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_config() {
        let settings = Config::default()
            .merge_with_args(&parse(&["device", "list"]))
            .unwrap();
        assert_eq!(settings.format, OutputFormat::Table);
        assert_eq!(settings.index_url, DEFAULT_INDEX_URL);
        assert_eq!(settings.dev.portal_url, DEFAULT_PORTAL_URL);
        assert_eq!(settings.dev.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.dev.downloads.existing, ExistingFileAction::Ask);
        assert!(settings.http.proxy.is_none());
    }

    #[test]
    fn test_cli_wins_over_file() {
        let config: Config = toml::from_str(
            r#"
            format = "json"
            proxy = "http://file-proxy:3128"
            index_url = "http://file-index/"

            [dev]
            page = 50
            username = "file@example.com"
            "#,
        )
        .unwrap();

        let settings = config
            .merge_with_args(&parse(&[
                "--proxy",
                "http://cli-proxy:3128",
                "dev",
                "--page",
                "5",
            ]))
            .unwrap();

        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.http.proxy.as_deref(), Some("http://cli-proxy:3128"));
        assert_eq!(settings.index_url, "http://file-index/");
        assert_eq!(settings.dev.page_size, 5);
        assert_eq!(settings.dev.username.as_deref(), Some("file@example.com"));
    }

    #[test]
    fn test_dev_flags() {
        let settings = Config::default()
            .merge_with_args(&parse(&[
                "dev",
                "--more",
                "--json",
                "--pretty",
                "-w",
                "Xcode",
                "-w",
                "KDK",
                "--resume-all",
                "--remove-commas",
                "-k",
                "vault-pw",
            ]))
            .unwrap();

        let dev = settings.dev;
        assert_eq!(dev.kind, Some(DownloadKind::More));
        assert!(dev.json && dev.pretty);
        assert_eq!(dev.watch, vec!["Xcode", "KDK"]);
        assert_eq!(dev.downloads.existing, ExistingFileAction::Resume);
        assert!(dev.downloads.remove_commas);
        assert!(dev.vault.password.is_some());
    }

    #[test]
    fn test_conflicting_existing_file_flags() {
        let result = Cli::try_parse_from(["fwgate", "dev", "--skip-all", "--restart-all"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_format_in_file() {
        let config = Config {
            format: Some("yaml".into()),
            ..Default::default()
        };
        assert!(config.merge_with_args(&parse(&["device", "list"])).is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = Config::default()
            .merge_with_args(&parse(&["dev", "--password", "hunter2"]))
            .unwrap();
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }
}
