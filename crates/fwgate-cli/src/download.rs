//! Streaming HTTP download executor

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use fwgate_core::{CredentialPrompt, DownloadItem, Error, HttpOptions, PromptOutcome, Result};
use fwgate_portal::{AuthToken, DownloadExecutor};

use crate::config::{DownloadPolicy, ExistingFileAction};

/// Downloads catalog items into a directory
pub struct HttpDownloader {
    client: Client,
    output_dir: PathBuf,
    policy: DownloadPolicy,
    prompt: Arc<dyn CredentialPrompt>,
    show_progress: bool,
}

/// How one file will be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Skip,
    Fresh,
    Resume(u64),
}

impl HttpDownloader {
    pub fn new(
        options: &HttpOptions,
        output_dir: impl Into<PathBuf>,
        policy: DownloadPolicy,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> Result<Self> {
        let client = options.build_client(false)?;
        Ok(Self::with_http_client(client, output_dir, policy, prompt))
    }

    /// Downloader around an existing reqwest client
    pub fn with_http_client(
        client: Client,
        output_dir: impl Into<PathBuf>,
        policy: DownloadPolicy,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            policy,
            prompt,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Where `item` will be written
    ///
    /// The name must be a plain file name; anything that would resolve
    /// outside the output directory is rejected.
    pub fn destination(&self, item: &DownloadItem) -> Result<PathBuf> {
        let name = if self.policy.remove_commas {
            item.file_name().replace(',', "")
        } else {
            item.file_name().to_string()
        };
        if matches!(name.as_str(), "" | "." | "..") || name.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "Unsafe download file name {:?} for {}",
                name, item.url
            )));
        }
        Ok(self.output_dir.join(name))
    }

    fn plan(&self, path: &Path) -> Result<Plan> {
        let existing = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Plan::Fresh),
            Err(e) => return Err(e.into()),
        };

        let action = match self.policy.existing {
            ExistingFileAction::Ask => {
                let options = vec!["Skip".to_string(), "Resume".to_string(), "Restart".to_string()];
                let message = format!("{} already exists", path.display());
                match self.prompt.select(&message, &options)? {
                    PromptOutcome::Value(0) => ExistingFileAction::Skip,
                    PromptOutcome::Value(1) => ExistingFileAction::Resume,
                    PromptOutcome::Value(_) => ExistingFileAction::Restart,
                    PromptOutcome::Cancelled => return Err(Error::Cancelled),
                }
            }
            other => other,
        };

        Ok(match action {
            ExistingFileAction::Skip => Plan::Skip,
            ExistingFileAction::Resume => Plan::Resume(existing),
            ExistingFileAction::Restart | ExistingFileAction::Ask => Plan::Fresh,
        })
    }

    fn confirmed(&self, item: &DownloadItem) -> Result<bool> {
        if !self.policy.confirm {
            return Ok(true);
        }
        let options = vec!["Yes".to_string(), "No".to_string()];
        match self.prompt.select(&format!("Download {}?", item.title), &options)? {
            PromptOutcome::Value(choice) => Ok(choice == 0),
            PromptOutcome::Cancelled => Err(Error::Cancelled),
        }
    }

    fn progress_bar(&self, total: Option<u64>, position: u64, name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = match total {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_position(position);
        pb.set_message(name.to_string());
        pb
    }

    /// Fetch one item according to the existing-file policy
    #[instrument(skip(self, token, item), fields(id = %item.id))]
    pub async fn fetch(&self, token: &AuthToken, item: &DownloadItem) -> Result<PathBuf> {
        let path = self.destination(item)?;
        let plan = self.plan(&path)?;
        if plan == Plan::Skip {
            info!(path = %path.display(), "Skipping existing file");
            return Ok(path);
        }

        let mut request = self.client.get(&item.url).bearer_auth(token.as_str());
        if let Plan::Resume(offset) = plan {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }
        let response = request.send().await?;

        let (append, offset) = match (plan, response.status()) {
            (Plan::Resume(offset), StatusCode::PARTIAL_CONTENT) => (true, offset),
            (Plan::Resume(_), StatusCode::RANGE_NOT_SATISFIABLE) => {
                info!(path = %path.display(), "File already complete");
                return Ok(path);
            }
            (Plan::Resume(_), StatusCode::OK) => {
                warn!("Server ignored range request, restarting download");
                (false, 0)
            }
            (_, StatusCode::OK) => (false, 0),
            (_, status) => {
                return Err(Error::api(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown error"),
                ))
            }
        };

        let total = response.content_length().map(|len| len + offset);
        debug!(?total, offset, append, "Downloading {}", item.url);

        let mut file = if append {
            OpenOptions::new().append(true).open(&path).await?
        } else {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .await?
        };

        let pb = self.progress_bar(total, offset, item.file_name());
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }
        file.flush().await?;
        pb.finish_and_clear();

        info!(path = %path.display(), "Downloaded {}", item.title);
        Ok(path)
    }
}

#[async_trait]
impl DownloadExecutor for HttpDownloader {
    async fn download(&self, token: &AuthToken, items: &[DownloadItem]) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        for item in items {
            if !self.confirmed(item)? {
                debug!(id = %item.id, "Download declined");
                continue;
            }
            self.fetch(token, item).await?;
        }
        Ok(())
    }
}
