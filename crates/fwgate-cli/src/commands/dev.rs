//! Dev command - developer-portal listing and downloads

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use fwgate_core::CredentialPrompt;
use fwgate_portal::{HttpPortalApi, PortalSession, SessionConfig};
use fwgate_vault::CredentialVault;

use crate::config::Settings;
use crate::download::HttpDownloader;
use crate::orchestrator::{DevOutcome, Orchestrator};
use crate::output::OutputContext;
use crate::prompt::TerminalPrompt;
use crate::signal::Interrupts;

/// Log in to the developer portal, then list or download
pub async fn dev(settings: &Settings, ctx: &OutputContext, interrupts: &Interrupts) -> Result<()> {
    let dev = &settings.dev;
    let prompt: Arc<dyn CredentialPrompt> = Arc::new(TerminalPrompt::new());

    let vault = CredentialVault::open(dev.vault.clone(), Some(prompt.clone()))
        .context("Failed to open credentials vault")?;
    let api = HttpPortalApi::with_options(&dev.portal_url, &settings.http)
        .context("Failed to create portal client")?;
    let session = PortalSession::new(
        Arc::new(api),
        SessionConfig {
            prefer_sms: dev.prefer_sms,
            page_size: dev.page_size,
            watch_interval: dev.watch_interval,
        },
    );

    let output_dir = dev.output.clone().unwrap_or_else(|| PathBuf::from("."));
    let downloader = HttpDownloader::new(
        &settings.http,
        output_dir,
        dev.downloads.clone(),
        prompt.clone(),
    )?
    .with_progress(!settings.quiet);

    let orchestrator = Orchestrator::new(dev, &vault, &session, prompt.as_ref(), &downloader, ctx);
    // Ctrl-C during the watch moves on to the listing
    let report = orchestrator.run_dev(interrupts.stop_watching()).await;
    session.close();
    let report = report?;

    match report.outcome {
        DevOutcome::Json { path: Some(path), .. } => {
            ctx.success(&format!("Wrote {} listing to {}", report.kind, path.display()));
        }
        DevOutcome::Json { path: None, bytes } => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            writeln!(stdout)?;
        }
        DevOutcome::Downloaded(0) => ctx.info("Nothing downloaded"),
        DevOutcome::Downloaded(count) => ctx.success(&format!("Downloaded {} item(s)", count)),
    }
    Ok(())
}
