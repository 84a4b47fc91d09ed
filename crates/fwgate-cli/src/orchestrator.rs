//! `dev` workflow: credentials, login, watch, then list or download

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use fwgate_core::{CredentialPrompt, Credentials, DownloadKind, Error, Result};
use fwgate_portal::{DownloadExecutor, PortalSession};
use fwgate_vault::CredentialVault;

use crate::config::DevSettings;
use crate::output::OutputContext;

const KIND_OPTIONS: [(&str, DownloadKind); 2] = [
    ("OSes (iOS, macOS, tvOS...)", DownloadKind::Os),
    ("More (XCode, KDKs...)", DownloadKind::More),
];

/// What a `dev` run ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevOutcome {
    /// Catalog listing as JSON; `path` is `None` when it belongs on stdout
    Json { path: Option<PathBuf>, bytes: Vec<u8> },
    /// Number of items handed to the download executor
    Downloaded(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevReport {
    pub kind: DownloadKind,
    /// New items reported while watching
    pub watched: usize,
    pub outcome: DevOutcome,
}

/// Drives one `dev` run over already constructed components
pub struct Orchestrator<'a> {
    settings: &'a DevSettings,
    vault: &'a CredentialVault,
    session: &'a PortalSession,
    prompt: &'a dyn CredentialPrompt,
    executor: &'a dyn DownloadExecutor,
    ctx: &'a OutputContext,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        settings: &'a DevSettings,
        vault: &'a CredentialVault,
        session: &'a PortalSession,
        prompt: &'a dyn CredentialPrompt,
        executor: &'a dyn DownloadExecutor,
        ctx: &'a OutputContext,
    ) -> Self {
        Self {
            settings,
            vault,
            session,
            prompt,
            executor,
            ctx,
        }
    }

    /// Run the workflow; `stop_watching` ends the watch phase
    #[instrument(skip_all)]
    pub async fn run_dev(&self, stop_watching: impl Future<Output = ()>) -> Result<DevReport> {
        let credentials = self.credentials()?;
        self.session.login(&credentials, self.prompt).await?;
        drop(credentials);

        let mut watched = 0;
        if !self.settings.watch.is_empty() {
            self.ctx.info(&format!(
                "Watching for {} (Ctrl-C to stop)",
                self.settings.watch.join(", ")
            ));
            let ctx = self.ctx;
            watched = self
                .session
                .watch(
                    &self.settings.watch,
                    self.settings.watch_interval,
                    stop_watching,
                    |item| ctx.success(&format!("New download: {} [{}]", item.title, item.kind)),
                )
                .await?;
        }

        let kind = self.download_kind()?;

        let outcome = if self.settings.json {
            let bytes = self
                .session
                .list_downloads_as_json(kind, self.settings.pretty)
                .await?;
            match &self.settings.output {
                Some(dir) => DevOutcome::Json {
                    path: Some(write_listing(dir, kind, &bytes)?),
                    bytes,
                },
                None => DevOutcome::Json { path: None, bytes },
            }
        } else {
            let count = self
                .session
                .download_prompt(kind, self.prompt, self.executor)
                .await?;
            DevOutcome::Downloaded(count)
        };

        Ok(DevReport {
            kind,
            watched,
            outcome,
        })
    }

    fn credentials(&self) -> Result<Credentials> {
        if let (Some(username), Some(password)) = (&self.settings.username, &self.settings.password) {
            return Ok(Credentials::new(username.as_str(), password.as_str()));
        }

        match self.vault.load_credentials() {
            Ok(credentials) => Ok(credentials),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                warn!(vault = %self.vault.location(), "Failed to get credentials from vault: {}", e);
                let credentials = self.ask_credentials()?;
                self.vault.store_credentials(&credentials);
                Ok(credentials)
            }
        }
    }

    fn ask_credentials(&self) -> Result<Credentials> {
        let username = match &self.settings.username {
            Some(username) => username.clone(),
            None => self
                .prompt
                .input("Please type your username:")?
                .into_result()?
                .trim()
                .to_string(),
        };
        let password = self
            .prompt
            .password("Please type your password:")?
            .into_result()?;
        Ok(Credentials::new(username, password))
    }

    fn download_kind(&self) -> Result<DownloadKind> {
        if let Some(kind) = self.settings.kind {
            return Ok(kind);
        }
        let options: Vec<String> = KIND_OPTIONS.iter().map(|(label, _)| label.to_string()).collect();
        let choice = self
            .prompt
            .select("Choose a download type:", &options)?
            .into_result()?;
        KIND_OPTIONS
            .get(choice)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| Error::Config(format!("download type {} is out of range", choice + 1)))
    }
}

/// Write a catalog listing to `<dir>/dev_portal_<kind>.json`
pub fn write_listing(dir: &Path, kind: DownloadKind, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(kind.json_file_name());
    info!("Creating {}", path.display());

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o660);
    }
    let mut file = options.open(&path)?;
    file.write_all(bytes)?;
    Ok(path)
}
