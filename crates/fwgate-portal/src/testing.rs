//! Test doubles for portal consumers
//!
//! [`MockPortal`] scripts the portal side of a session: which credentials
//! it accepts, whether it asks for a two-factor code and what each catalog
//! partition contains. [`RecordingExecutor`] captures what would have been
//! downloaded. [`ScriptedPrompt`] answers terminal prompts from a queue.
//!
//! # Example
//!
//! ```rust,ignore
//! let portal = MockPortal::new("dev@example.com", "hunter2")
//!     .with_items(DownloadKind::More, vec![item("1", "Xcode 15")]);
//! let session = PortalSession::new(Arc::new(portal.clone()), SessionConfig::default());
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use fwgate_core::{
    CredentialPrompt, Credentials, DownloadItem, DownloadKind, Error, PromptOutcome, Result,
};

use crate::api::{
    AuthToken, DownloadExecutor, PortalApi, SignInOutcome, TwoFactorChallenge, VerifyMethod,
};

const MOCK_TOKEN: &str = "mock-token";

#[derive(Default)]
struct MockState {
    catalog: HashMap<DownloadKind, Vec<DownloadItem>>,
    calls: Vec<String>,
    failing_lists: usize,
}

/// Scripted [`PortalApi`]
///
/// Clones share state, so a test can keep one handle while the session owns
/// another.
#[derive(Clone)]
pub struct MockPortal {
    username: String,
    password: String,
    two_factor_code: Option<String>,
    state: Arc<Mutex<MockState>>,
}

impl MockPortal {
    /// Portal accepting exactly these credentials
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            two_factor_code: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Require a two-factor code after the password
    pub fn with_two_factor(mut self, code: &str) -> Self {
        self.two_factor_code = Some(code.to_string());
        self
    }

    pub fn with_items(self, kind: DownloadKind, items: Vec<DownloadItem>) -> Self {
        self.state.lock().catalog.insert(kind, items);
        self
    }

    /// Make an item appear in a partition from the next listing on
    pub fn publish(&self, kind: DownloadKind, item: DownloadItem) {
        self.state.lock().catalog.entry(kind).or_default().push(item);
    }

    /// Fail the next `count` catalog requests with a 503
    pub fn fail_next_lists(&self, count: usize) {
        self.state.lock().failing_lists = count;
    }

    /// Names of the API calls made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn sign_in_count(&self) -> usize {
        self.calls().iter().filter(|c| *c == "sign_in").count()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().calls.push(call.into());
    }
}

/// Build a catalog item with a predictable URL
pub fn item(id: &str, title: &str) -> DownloadItem {
    DownloadItem {
        id: id.to_string(),
        title: title.to_string(),
        kind: DownloadKind::More,
        category: None,
        release_date: None,
        url: format!("https://download.example.com/{}/{}.dmg", id, title.replace(' ', "_")),
        size: None,
    }
}

#[async_trait]
impl PortalApi for MockPortal {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignInOutcome> {
        self.record("sign_in");
        if credentials.username != self.username || credentials.password != self.password {
            return Err(Error::Auth("portal rejected username or password".into()));
        }
        match self.two_factor_code {
            Some(_) => Ok(SignInOutcome::TwoFactorRequired(TwoFactorChallenge {
                session: "mock-session".into(),
                trusted_phone_id: Some(1),
                phone_number: Some("(•••) •••-••42".into()),
            })),
            None => Ok(SignInOutcome::Authenticated(AuthToken::new(MOCK_TOKEN))),
        }
    }

    async fn request_sms_code(&self, _challenge: &TwoFactorChallenge) -> Result<()> {
        self.record("request_sms_code");
        Ok(())
    }

    async fn verify_code(
        &self,
        challenge: &TwoFactorChallenge,
        method: VerifyMethod,
        code: &str,
    ) -> Result<AuthToken> {
        self.record(format!("verify_code:{}", method.as_path()));
        if challenge.session != "mock-session" || self.two_factor_code.as_deref() != Some(code) {
            return Err(Error::Auth("portal rejected verification code".into()));
        }
        Ok(AuthToken::new(MOCK_TOKEN))
    }

    async fn list_downloads(
        &self,
        token: &AuthToken,
        kind: DownloadKind,
    ) -> Result<Vec<DownloadItem>> {
        let mut state = self.state.lock();
        state.calls.push(format!("list_downloads:{}", kind));
        if token.as_str() != MOCK_TOKEN {
            return Err(Error::Auth("portal session expired".into()));
        }
        if state.failing_lists > 0 {
            state.failing_lists -= 1;
            return Err(Error::api(503, "Service Unavailable"));
        }
        Ok(state.catalog.get(&kind).cloned().unwrap_or_default())
    }
}

/// [`DownloadExecutor`] that only records what it was given
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    batches: Arc<Mutex<Vec<Vec<DownloadItem>>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every batch passed to `download`, in call order
    pub fn batches(&self) -> Vec<Vec<DownloadItem>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl DownloadExecutor for RecordingExecutor {
    async fn download(&self, _token: &AuthToken, items: &[DownloadItem]) -> Result<()> {
        self.batches.lock().push(items.to_vec());
        Ok(())
    }
}

/// One queued answer for [`ScriptedPrompt`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Answers an `input` or `password` prompt
    Text(String),
    /// Answers a `select` prompt
    Choice(usize),
    /// Answers a `multi_select` prompt
    Choices(Vec<usize>),
    /// Cancels whatever prompt comes next
    Cancel,
}

/// [`CredentialPrompt`] answering from a queue
///
/// Panics when a prompt arrives with no answer queued or with an answer of
/// the wrong shape, so unexpected prompts fail the test loudly.
#[derive(Clone, Default)]
pub struct ScriptedPrompt {
    answers: Arc<Mutex<VecDeque<Answer>>>,
    asked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        let prompt = Self::default();
        prompt.answers.lock().extend(answers);
        prompt
    }

    /// Messages of every prompt shown so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.lock().len()
    }

    fn next(&self, message: &str) -> Answer {
        self.asked.lock().push(message.to_string());
        self.answers
            .lock()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected prompt: {}", message))
    }

    fn text(&self, message: &str) -> Result<PromptOutcome<String>> {
        match self.next(message) {
            Answer::Text(text) => Ok(PromptOutcome::Value(text)),
            Answer::Cancel => Ok(PromptOutcome::Cancelled),
            other => panic!("expected text answer for {:?}, got {:?}", message, other),
        }
    }
}

impl CredentialPrompt for ScriptedPrompt {
    fn input(&self, message: &str) -> Result<PromptOutcome<String>> {
        self.text(message)
    }

    fn password(&self, message: &str) -> Result<PromptOutcome<String>> {
        self.text(message)
    }

    fn select(&self, message: &str, options: &[String]) -> Result<PromptOutcome<usize>> {
        match self.next(message) {
            Answer::Choice(index) => {
                assert!(index < options.len(), "choice {} out of range", index);
                Ok(PromptOutcome::Value(index))
            }
            Answer::Cancel => Ok(PromptOutcome::Cancelled),
            other => panic!("expected choice for {:?}, got {:?}", message, other),
        }
    }

    fn multi_select(
        &self,
        message: &str,
        _options: &[String],
        _page_size: usize,
    ) -> Result<PromptOutcome<Vec<usize>>> {
        match self.next(message) {
            Answer::Choices(indices) => Ok(PromptOutcome::Value(indices)),
            Answer::Cancel => Ok(PromptOutcome::Cancelled),
            other => panic!("expected choices for {:?}, got {:?}", message, other),
        }
    }
}
