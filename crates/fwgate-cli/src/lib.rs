//! fwgate - Apple firmware metadata and developer-portal downloads
//!
//! The binary is a thin wrapper around [`run`]; the pieces it composes are
//! public so integration tests can drive them with test doubles.

pub mod cli;
pub mod commands;
pub mod config;
pub mod download;
pub mod exit;
pub mod orchestrator;
pub mod output;
pub mod prompt;
pub mod signal;

use anyhow::{Context, Result};
use fwgate_index::MetadataClient;
use fwgate_traits::DeviceTraitResolver;

use crate::cli::{Cli, Commands, DeviceCommand, IpswCommand, ResolveCommand};
use crate::config::{Config, Settings};
use crate::output::OutputContext;
use crate::signal::Interrupts;

/// Execute one parsed command line
///
/// `interrupts` decides what Ctrl-C means while the command runs.
pub async fn run(cli: Cli, interrupts: Interrupts) -> Result<()> {
    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let settings = config.merge_with_args(&cli)?;
    let ctx = OutputContext::new(settings.format, settings.no_color, settings.quiet);

    match &cli.command {
        Commands::Dev(_) => commands::dev(&settings, &ctx, &interrupts).await?,

        Commands::Device { command } => {
            let client = create_index_client(&settings)?;
            match command {
                DeviceCommand::List => commands::device_list(&client, &ctx).await?,
                DeviceCommand::Get { identifier } => {
                    commands::device_get(&client, identifier, &ctx).await?
                }
            }
        }

        Commands::Ipsw { command } => {
            let client = create_index_client(&settings)?;
            match command {
                IpswCommand::Version { os_version } => {
                    commands::ipsw_version(&client, os_version, &ctx).await?
                }
                IpswCommand::Get { identifier, build } => {
                    commands::ipsw_get(&client, identifier, build, &ctx).await?
                }
            }
        }

        Commands::Resolve { command } => {
            let client = create_index_client(&settings)?;
            match command {
                ResolveCommand::Version { build } => {
                    commands::resolve_version(&client, build, &ctx).await?
                }
                ResolveCommand::Build {
                    os_version,
                    identifier,
                } => commands::resolve_build(&client, os_version, identifier, &ctx).await?,
            }
        }

        Commands::Traits { command, .. } => {
            let resolver = match &settings.traits_file {
                Some(path) => DeviceTraitResolver::from_file(path),
                None => DeviceTraitResolver::embedded(),
            };
            commands::traits(&resolver, command, &ctx)?;
        }
    }

    Ok(())
}

fn create_index_client(settings: &Settings) -> Result<MetadataClient> {
    MetadataClient::with_options(&settings.index_url, &settings.http)
        .with_context(|| format!("Failed to create client for {}", settings.index_url))
}
