//! Operator interaction seam.
//!
//! Workflows talk to the operator through [`Prompt`] so the CLI, an
//! unattended run, and the tests can supply different frontends. Every
//! caught error path in the workflows produces a message through here;
//! nothing fails silently.

use async_trait::async_trait;
use console::{style, Term};

use crate::error::AdminError;

/// User-facing confirmation, selection, and notification.
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Yes/no confirmation. Returning `false` cancels the operation.
    async fn confirm(&self, message: &str) -> Result<bool, AdminError>;

    /// Pick one option from a list; `None` cancels.
    async fn choose(&self, title: &str, options: &[String]) -> Result<Option<usize>, AdminError>;

    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

#[async_trait]
impl<P: Prompt + ?Sized> Prompt for std::sync::Arc<P> {
    async fn confirm(&self, message: &str) -> Result<bool, AdminError> {
        (**self).confirm(message).await
    }

    async fn choose(&self, title: &str, options: &[String]) -> Result<Option<usize>, AdminError> {
        (**self).choose(title, options).await
    }

    fn info(&self, message: &str) {
        (**self).info(message)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}

/// Terminal-backed prompt used by the CLI.
pub struct ConsolePrompt {
    term: Term,
    /// Skip confirmations (the `--yes` flag).
    assume_yes: bool,
    /// Pre-selected choice (e.g. `--reason`), matched case-insensitively.
    preset_choice: Option<String>,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            assume_yes: false,
            preset_choice: None,
        }
    }

    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn with_preset_choice(mut self, choice: Option<String>) -> Self {
        self.preset_choice = choice;
        self
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompt for ConsolePrompt {
    async fn confirm(&self, message: &str) -> Result<bool, AdminError> {
        if self.assume_yes {
            return Ok(true);
        }
        self.term
            .write_str(&format!("{message} [y/N] "))
            .map_err(AdminError::Io)?;
        let answer = self.term.read_line().map_err(AdminError::Io)?;
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    async fn choose(&self, title: &str, options: &[String]) -> Result<Option<usize>, AdminError> {
        if options.is_empty() {
            return Ok(None);
        }
        if let Some(preset) = &self.preset_choice {
            if let Some(idx) = options
                .iter()
                .position(|o| o.eq_ignore_ascii_case(preset.trim()))
            {
                return Ok(Some(idx));
            }
            self.warn(&format!("'{preset}' is not one of the offered options"));
        }

        self.term
            .write_line(&format!("{}", style(title).bold()))
            .map_err(AdminError::Io)?;
        for (i, option) in options.iter().enumerate() {
            self.term
                .write_line(&format!("  {}. {option}", i + 1))
                .map_err(AdminError::Io)?;
        }
        self.term
            .write_str("Select a number (empty to cancel): ")
            .map_err(AdminError::Io)?;
        let answer = self.term.read_line().map_err(AdminError::Io)?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => Ok(Some(n - 1)),
            _ => Ok(None),
        }
    }

    fn info(&self, message: &str) {
        let _ = self.term.write_line(message);
    }

    fn warn(&self, message: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {message}", style("warning:").yellow().bold()));
    }

    fn error(&self, message: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {message}", style("error:").red().bold()));
    }
}
