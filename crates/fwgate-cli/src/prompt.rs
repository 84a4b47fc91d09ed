//! Terminal implementation of the prompt capability

use std::io::{self, BufRead, IsTerminal, Write};

use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use fwgate_core::{CredentialPrompt, PromptOutcome, Result};

/// Line-based prompts on stderr/stdin
///
/// On a terminal, lines are read key by key in raw mode, so Ctrl-C, Ctrl-D
/// on an empty line and Esc cancel the prompt instead of raising a signal.
/// Piped input is read line by line and cancels at end of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

/// Effect of one key press on the line being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Insert(char),
    Erase,
    Submit,
    Cancel,
    Ignore,
}

/// Apply `key` to `line`
pub fn apply_key(line: &mut String, key: KeyEvent) -> KeyAction {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if control => KeyAction::Cancel,
        KeyCode::Char('d') if control && line.is_empty() => KeyAction::Cancel,
        KeyCode::Esc => KeyAction::Cancel,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Backspace => match line.pop() {
            Some(_) => KeyAction::Erase,
            None => KeyAction::Ignore,
        },
        KeyCode::Char(c) if !control => {
            line.push(c);
            KeyAction::Insert(c)
        }
        _ => KeyAction::Ignore,
    }
}

/// Raw mode for the lifetime of the guard
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self, message: &str, masked: bool) -> Result<PromptOutcome<String>> {
        let mut stderr = io::stderr();
        write!(stderr, "{} ", message.bold())?;
        stderr.flush()?;

        if io::stdin().is_terminal() {
            self.read_line_raw(masked)
        } else {
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line)? {
                0 => Ok(PromptOutcome::Cancelled),
                _ => Ok(PromptOutcome::Value(
                    line.trim_end_matches(['\r', '\n']).to_string(),
                )),
            }
        }
    }

    fn read_line_raw(&self, masked: bool) -> Result<PromptOutcome<String>> {
        let mut stderr = io::stderr();
        let mut line = String::new();

        let outcome = {
            let _raw = RawMode::enable()?;
            loop {
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                match apply_key(&mut line, key) {
                    KeyAction::Insert(c) if !masked => write!(stderr, "{}", c)?,
                    KeyAction::Erase if !masked => write!(stderr, "\x08 \x08")?,
                    KeyAction::Submit => break PromptOutcome::Value(std::mem::take(&mut line)),
                    KeyAction::Cancel => break PromptOutcome::Cancelled,
                    _ => {}
                }
                stderr.flush()?;
            }
        };

        writeln!(stderr)?;
        Ok(outcome)
    }
}

impl CredentialPrompt for TerminalPrompt {
    fn input(&self, message: &str) -> Result<PromptOutcome<String>> {
        self.read_line(message, false)
    }

    fn password(&self, message: &str) -> Result<PromptOutcome<String>> {
        self.read_line(message, true)
    }

    fn select(&self, message: &str, options: &[String]) -> Result<PromptOutcome<usize>> {
        for (i, option) in options.iter().enumerate() {
            eprintln!("  {}) {}", i + 1, option);
        }
        loop {
            let answer = match self.read_line(&format!("{} [1-{}]", message, options.len()), false)? {
                PromptOutcome::Value(answer) => answer,
                PromptOutcome::Cancelled => return Ok(PromptOutcome::Cancelled),
            };
            match answer.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(PromptOutcome::Value(n - 1)),
                _ if answer.trim().is_empty() => return Ok(PromptOutcome::Cancelled),
                _ => eprintln!("{}", format!("Enter a number between 1 and {}", options.len()).yellow()),
            }
        }
    }

    fn multi_select(
        &self,
        message: &str,
        options: &[String],
        page_size: usize,
    ) -> Result<PromptOutcome<Vec<usize>>> {
        let page_size = page_size.max(1);
        let pages = options.len().div_ceil(page_size).max(1);
        let mut page = 0;
        let mut selected: Vec<usize> = Vec::new();

        loop {
            let start = page * page_size;
            let end = (start + page_size).min(options.len());
            eprintln!("{} (page {}/{})", message.bold(), page + 1, pages);
            for (i, option) in options[start..end].iter().enumerate() {
                let marker = if selected.contains(&(start + i)) { "[x]" } else { "[ ]" };
                eprintln!("  {} {}", marker, option);
            }

            let answer = match self.read_line(
                "Numbers/ranges to toggle (e.g. 1 3-5), n/p to page, enter to finish, q to quit:",
                false,
            )? {
                PromptOutcome::Value(answer) => answer,
                PromptOutcome::Cancelled => return Ok(PromptOutcome::Cancelled),
            };

            match answer.trim() {
                "" => {
                    selected.sort_unstable();
                    return Ok(PromptOutcome::Value(selected));
                }
                "q" => return Ok(PromptOutcome::Cancelled),
                "n" => page = (page + 1).min(pages - 1),
                "p" => page = page.saturating_sub(1),
                input => match parse_selection(input, options.len()) {
                    Ok(indices) => {
                        for index in indices {
                            if let Some(pos) = selected.iter().position(|&s| s == index) {
                                selected.remove(pos);
                            } else {
                                selected.push(index);
                            }
                        }
                    }
                    Err(msg) => eprintln!("{}", msg.yellow()),
                },
            }
        }
    }
}

/// Parse 1-based numbers and ranges ("1 3-5,7") into sorted 0-based indices
pub fn parse_selection(input: &str, len: usize) -> std::result::Result<Vec<usize>, String> {
    let mut indices = Vec::new();

    for token in input.split([',', ' ']).filter(|t| !t.is_empty()) {
        let (from, to) = match token.split_once('-') {
            Some((from, to)) => (from, to),
            None => (token, token),
        };
        let from: usize = from
            .trim()
            .parse()
            .map_err(|_| format!("Not a number: {}", token))?;
        let to: usize = to
            .trim()
            .parse()
            .map_err(|_| format!("Not a number: {}", token))?;

        if from == 0 || to > len || from > to {
            return Err(format!("Out of range: {} (valid: 1-{})", token, len));
        }
        indices.extend((from - 1)..to);
    }

    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_numbers() {
        assert_eq!(parse_selection("1 3", 5).unwrap(), vec![0, 2]);
        assert_eq!(parse_selection("3,1", 5).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_parse_ranges_and_duplicates() {
        assert_eq!(parse_selection("2-4 3", 5).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_selection("5-5", 5).unwrap(), vec![4]);
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(parse_selection("0", 5).is_err());
        assert!(parse_selection("6", 5).is_err());
        assert!(parse_selection("4-2", 5).is_err());
        assert!(parse_selection("x", 5).is_err());
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_line_editing() {
        let mut line = String::new();
        for c in "ab".chars() {
            assert_eq!(apply_key(&mut line, key(KeyCode::Char(c), KeyModifiers::NONE)), KeyAction::Insert(c));
        }
        assert_eq!(
            apply_key(&mut line, key(KeyCode::Char('C'), KeyModifiers::SHIFT)),
            KeyAction::Insert('C')
        );
        assert_eq!(apply_key(&mut line, key(KeyCode::Backspace, KeyModifiers::NONE)), KeyAction::Erase);
        assert_eq!(line, "ab");
        assert_eq!(apply_key(&mut line, key(KeyCode::Enter, KeyModifiers::NONE)), KeyAction::Submit);
        assert_eq!(line, "ab");

        let mut empty = String::new();
        assert_eq!(apply_key(&mut empty, key(KeyCode::Backspace, KeyModifiers::NONE)), KeyAction::Ignore);
    }

    #[test]
    fn test_ctrl_c_cancels_instead_of_signalling() {
        let mut line = String::from("hunter");
        assert_eq!(
            apply_key(&mut line, key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Cancel
        );
        assert_eq!(apply_key(&mut line, key(KeyCode::Esc, KeyModifiers::NONE)), KeyAction::Cancel);

        // Ctrl-D only cancels an empty line
        assert_eq!(
            apply_key(&mut line, key(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            KeyAction::Ignore
        );
        let mut empty = String::new();
        assert_eq!(
            apply_key(&mut empty, key(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            KeyAction::Cancel
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_selection("", 5).unwrap().is_empty());
    }
}
