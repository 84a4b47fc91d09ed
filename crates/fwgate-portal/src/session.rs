//! Portal session state machine

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use fwgate_core::{
    sort_download_items, CredentialPrompt, Credentials, DownloadItem, DownloadKind, Error,
    PromptOutcome, Result, SessionState,
};

use crate::api::{AuthToken, DownloadExecutor, PortalApi, SignInOutcome, VerifyMethod};

/// Items shown per page in the download selection
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Pause between two watch polls
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(300);

/// Session behavior
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Request two-factor codes by SMS instead of a trusted device
    pub prefer_sms: bool,
    pub page_size: usize,
    pub watch_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prefer_sms: false,
            page_size: DEFAULT_PAGE_SIZE,
            watch_interval: DEFAULT_WATCH_INTERVAL,
        }
    }
}

/// Authenticated developer-portal session
///
/// `login` is the only way into `LoggedIn`. Listing, watching and
/// downloading each move the session into their own state for their
/// duration and always hand it back to `LoggedIn`, also when they fail or
/// their future is dropped.
pub struct PortalSession {
    api: Arc<dyn PortalApi>,
    config: SessionConfig,
    state: RwLock<SessionState>,
    token: RwLock<Option<AuthToken>>,
}

impl std::fmt::Debug for PortalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalSession")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Returns the session to `LoggedIn` when an activity ends
struct Activity<'a> {
    session: &'a PortalSession,
    token: AuthToken,
}

impl Drop for Activity<'_> {
    fn drop(&mut self) {
        let mut state = self.session.state.write();
        if *state != SessionState::Closed {
            *state = SessionState::LoggedIn;
        }
    }
}

impl PortalSession {
    pub fn new(api: Arc<dyn PortalApi>, config: SessionConfig) -> Self {
        Self {
            api,
            config,
            state: RwLock::new(SessionState::New),
            token: RwLock::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Sign in, answering a two-factor challenge through `prompt` if needed
    ///
    /// Rejected credentials or codes fail with `Error::Auth`; nothing is
    /// retried.
    #[instrument(skip(self, credentials, prompt), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials, prompt: &dyn CredentialPrompt) -> Result<()> {
        match self.state() {
            SessionState::New | SessionState::LoggedIn => {}
            SessionState::Closed => {
                return Err(Error::NotAuthenticated("session is closed".into()));
            }
            other => {
                return Err(Error::NotAuthenticated(format!(
                    "cannot log in while session is {:?}",
                    other
                )));
            }
        }

        let token = match self.api.sign_in(credentials).await? {
            SignInOutcome::Authenticated(token) => token,
            SignInOutcome::TwoFactorRequired(challenge) => {
                let (method, message) = if self.config.prefer_sms {
                    self.api.request_sms_code(&challenge).await?;
                    (VerifyMethod::Phone, "Please type your SMS code:")
                } else {
                    (VerifyMethod::TrustedDevice, "Please type your verification code:")
                };
                debug!(method = method.as_path(), "Awaiting two-factor code");

                let code = prompt.input(message)?.into_result()?;
                self.api.verify_code(&challenge, method, code.trim()).await?
            }
        };

        *self.token.write() = Some(token);
        *self.state.write() = SessionState::LoggedIn;
        info!("Logged in to developer portal");
        Ok(())
    }

    /// End the session; every later operation fails with `NotAuthenticated`
    pub fn close(&self) {
        *self.token.write() = None;
        *self.state.write() = SessionState::Closed;
        debug!("Portal session closed");
    }

    fn begin(&self, activity: SessionState) -> Result<Activity<'_>> {
        let mut state = self.state.write();
        if *state != SessionState::LoggedIn {
            return Err(Error::NotAuthenticated(format!(
                "cannot start {:?} while session is {:?}",
                activity, *state
            )));
        }
        let token = self
            .token
            .read()
            .clone()
            .ok_or_else(|| Error::NotAuthenticated("no portal token".into()))?;

        *state = activity;
        Ok(Activity {
            session: self,
            token,
        })
    }

    async fn fetch(&self, token: &AuthToken, kind: DownloadKind) -> Result<Vec<DownloadItem>> {
        let mut items = self.api.list_downloads(token, kind).await?;
        for item in &mut items {
            item.kind = kind;
        }
        sort_download_items(&mut items);
        debug!(%kind, count = items.len(), "Fetched catalog");
        Ok(items)
    }

    /// One catalog partition, sorted by title then id
    #[instrument(skip(self))]
    pub async fn list_downloads(&self, kind: DownloadKind) -> Result<Vec<DownloadItem>> {
        let activity = self.begin(SessionState::Listing)?;
        self.fetch(&activity.token, kind).await
    }

    /// The same listing as [`list_downloads`](Self::list_downloads), as JSON bytes
    pub async fn list_downloads_as_json(&self, kind: DownloadKind, pretty: bool) -> Result<Vec<u8>> {
        let items = self.list_downloads(kind).await?;
        let json = if pretty {
            serde_json::to_vec_pretty(&items)?
        } else {
            serde_json::to_vec(&items)?
        };
        Ok(json)
    }

    /// Poll both partitions for items matching any watch term
    ///
    /// The first poll only records what already exists. Items seen for the
    /// first time on later polls are logged and passed to `on_new`. Returns
    /// the number of new items once `shutdown` resolves.
    #[instrument(skip(self, shutdown, on_new))]
    pub async fn watch<F>(
        &self,
        watch_list: &[String],
        interval: Duration,
        shutdown: impl Future<Output = ()>,
        mut on_new: F,
    ) -> Result<usize>
    where
        F: FnMut(&DownloadItem),
    {
        let terms: Vec<&str> = watch_list
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(Error::Config("watch list is empty".into()));
        }

        let activity = self.begin(SessionState::Watching)?;
        tokio::pin!(shutdown);

        let mut seen: HashSet<String> = HashSet::new();
        let mut baseline = true;
        let mut reported = 0;

        loop {
            let matches = tokio::select! {
                _ = &mut shutdown => break,
                polled = self.poll_watched(&activity.token, &terms) => polled?,
            };

            for item in matches {
                if seen.insert(item.id.clone()) && !baseline {
                    info!(id = %item.id, title = %item.title, kind = %item.kind, "New download available");
                    on_new(&item);
                    reported += 1;
                }
            }
            if baseline {
                debug!(tracked = seen.len(), "Watch baseline recorded");
                baseline = false;
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!(reported, "Watch stopped");
        Ok(reported)
    }

    async fn poll_watched(&self, token: &AuthToken, terms: &[&str]) -> Result<Vec<DownloadItem>> {
        let mut matches = Vec::new();
        for kind in DownloadKind::ALL {
            let items = self.fetch(token, kind).await?;
            matches.extend(
                items
                    .into_iter()
                    .filter(|item| terms.iter().any(|t| item.matches_term(t))),
            );
        }
        Ok(matches)
    }

    /// Let the user pick items from one partition and download them
    ///
    /// Options are numbered from 1 in listing order. Cancelling the
    /// selection, or selecting nothing, downloads nothing. Returns the
    /// number of items handed to `executor`.
    #[instrument(skip(self, prompt, executor))]
    pub async fn download_prompt(
        &self,
        kind: DownloadKind,
        prompt: &dyn CredentialPrompt,
        executor: &dyn DownloadExecutor,
    ) -> Result<usize> {
        let activity = self.begin(SessionState::Downloading)?;
        let items = self.fetch(&activity.token, kind).await?;
        if items.is_empty() {
            warn!(%kind, "No downloads available");
            return Ok(0);
        }

        let options: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, item)| match &item.release_date {
                Some(date) => format!("{:>3}) {} ({})", i + 1, item.title, date),
                None => format!("{:>3}) {}", i + 1, item.title),
            })
            .collect();

        let page_size = self.config.page_size.max(1);
        let selected = match prompt.multi_select("Select what to download:", &options, page_size)? {
            PromptOutcome::Value(selected) => selected,
            PromptOutcome::Cancelled => {
                debug!("Download selection cancelled");
                return Ok(0);
            }
        };

        let chosen = selected
            .into_iter()
            .map(|index| {
                items.get(index).cloned().ok_or_else(|| {
                    Error::Config(format!("selection {} is out of range", index + 1))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if chosen.is_empty() {
            return Ok(0);
        }

        info!(count = chosen.len(), "Starting downloads");
        executor.download(&activity.token, &chosen).await?;
        Ok(chosen.len())
    }
}
