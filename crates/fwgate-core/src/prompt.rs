//! Interactive prompt capability
//!
//! Vault unlocking, portal login and download selection all need to ask the
//! user something. They receive a [`CredentialPrompt`] instead of talking to
//! the terminal themselves, so tests can script the answers and the binary
//! can decide what a cancelled prompt means.

use crate::error::{Error, Result};

/// Answer from a single prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome<T> {
    /// The user supplied a value
    Value(T),
    /// The user backed out (Ctrl-C, EOF, empty selection on a required prompt)
    Cancelled,
}

impl<T> PromptOutcome<T> {
    /// Convert into a `Result`, mapping cancellation to [`Error::Cancelled`]
    pub fn into_result(self) -> Result<T> {
        match self {
            PromptOutcome::Value(value) => Ok(value),
            PromptOutcome::Cancelled => Err(Error::Cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PromptOutcome::Cancelled)
    }
}

/// Terminal interaction used by the vault, the portal session and the CLI
///
/// Implementations block the calling thread until the user answers.
pub trait CredentialPrompt: Send + Sync {
    /// Ask for a visible line of text
    fn input(&self, message: &str) -> Result<PromptOutcome<String>>;

    /// Ask for a secret without echoing it
    fn password(&self, message: &str) -> Result<PromptOutcome<String>>;

    /// Ask the user to pick exactly one option; returns its index
    fn select(&self, message: &str, options: &[String]) -> Result<PromptOutcome<usize>>;

    /// Ask the user to pick any number of options; returns sorted, de-duplicated
    /// indices. `page_size` bounds how many options are shown at a time.
    fn multi_select(
        &self,
        message: &str,
        options: &[String],
        page_size: usize,
    ) -> Result<PromptOutcome<Vec<usize>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result() {
        assert_eq!(PromptOutcome::Value(3).into_result().unwrap(), 3);
        let cancelled: PromptOutcome<u8> = PromptOutcome::Cancelled;
        assert!(cancelled.is_cancelled());
        assert!(cancelled.into_result().unwrap_err().is_cancelled());
    }
}
