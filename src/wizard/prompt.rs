//! Line-oriented prompting
//!
//! The wizard talks to the user only through [`Prompter`]. Implementors
//! supply raw line input and output; answer parsing is shared.

use crate::error::{Result, WizardError};
use console::{style, Term};
use std::io::BufRead;

/// Severity of a message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Warning,
    Error,
}

/// Input and output for the wizard
pub trait Prompter {
    /// Show `prompt` and read one line without its terminator.
    /// A closed input stream yields [`WizardError::Cancelled`].
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Print a plain line
    fn print(&mut self, line: &str);

    /// Print a message with a severity marker
    fn notify(&mut self, notice: Notice, message: &str);

    /// Free text. Empty input keeps `default`.
    fn input(&mut self, prompt: &str, default: &str) -> Result<String> {
        let label = if default.is_empty() {
            format!("{}: ", prompt)
        } else {
            format!("{} [{}]: ", prompt, default)
        };
        let line = self.read_line(&label)?;
        let line = line.trim();
        Ok(if line.is_empty() { default.to_string() } else { line.to_string() })
    }

    /// Yes/no question
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let line = self.read_line(&format!("{} [{}]: ", prompt, hint))?;
            match parse_yes_no(&line, default) {
                Some(answer) => return Ok(answer),
                None => self.notify(Notice::Warning, "Please answer y or n"),
            }
        }
    }

    /// Pick one of `items` by number; returns the zero-based index
    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        if items.is_empty() {
            return Err(WizardError::config(format!("Nothing to choose for: {}", prompt)));
        }
        let default = default.min(items.len() - 1);

        self.print(prompt);
        for (i, item) in items.iter().enumerate() {
            let marker = if i == default { '>' } else { ' ' };
            self.print(&format!("{} {:>2}. {}", marker, i + 1, item));
        }

        loop {
            let line = self.read_line(&format!("Choice [{}]: ", default + 1))?;
            match parse_choice(&line, items.len(), default) {
                Some(index) => return Ok(index),
                None => self.notify(
                    Notice::Warning,
                    &format!("Enter a number between 1 and {}", items.len()),
                ),
            }
        }
    }
}

/// `y`, `yes`, `n`, `no` in any case; empty gives the default
pub fn parse_yes_no(line: &str, default: bool) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// One-based menu number; empty gives the default
pub fn parse_choice(line: &str, len: usize, default: usize) -> Option<usize> {
    let line = line.trim();
    if line.is_empty() {
        return Some(default);
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// Terminal prompter: styled output through `console`, input from any reader
pub struct TermPrompter<R> {
    term: Term,
    reader: R,
}

impl TermPrompter<std::io::StdinLock<'static>> {
    /// Prompter on stdout/stdin
    pub fn stdio() -> Self {
        Self::new(Term::stdout(), std::io::stdin().lock())
    }
}

impl<R: BufRead> TermPrompter<R> {
    pub fn new(term: Term, reader: R) -> Self {
        Self { term, reader }
    }

    fn write(&self, line: &str) {
        if let Err(e) = self.term.write_line(line) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl<R: BufRead> Prompter for TermPrompter<R> {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        self.term
            .write_str(&style(prompt).cyan().to_string())
            .map_err(|e| WizardError::io("<terminal>", e))?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| WizardError::io("<stdin>", e))?;
        if read == 0 {
            return Err(WizardError::Cancelled);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn print(&mut self, line: &str) {
        self.write(line);
    }

    fn notify(&mut self, notice: Notice, message: &str) {
        let line = match notice {
            Notice::Info => format!("{} {}", style("i").blue(), message),
            Notice::Success => format!("{} {}", style("✓").green(), message),
            Notice::Warning => format!("{} {}", style("!").yellow(), style(message).yellow()),
            Notice::Error => format!("{} {}", style("✗").red(), style(message).red()),
        };
        self.write(&line);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedPrompter;
    use super::*;
    use std::io::Cursor;

    fn items() -> Vec<String> {
        vec!["cpu".to_string(), "gpu".to_string(), "mpi".to_string()]
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_yes_no("", true), Some(true));
        assert_eq!(parse_yes_no(" YES ", false), Some(true));
        assert_eq!(parse_yes_no("n", true), Some(false));
        assert_eq!(parse_yes_no("maybe", true), None);

        assert_eq!(parse_choice("", 3, 1), Some(1));
        assert_eq!(parse_choice("3", 3, 0), Some(2));
        assert_eq!(parse_choice("0", 3, 0), None);
        assert_eq!(parse_choice("4", 3, 0), None);
        assert_eq!(parse_choice("x", 3, 0), None);
    }

    #[test]
    fn test_input_keeps_default_on_empty() {
        let mut p = ScriptedPrompter::new(&["", "  train  "]);
        assert_eq!(p.input("Name", "job").unwrap(), "job");
        assert_eq!(p.input("Name", "job").unwrap(), "train");
        assert!(matches!(p.input("Name", ""), Err(WizardError::Cancelled)));
    }

    #[test]
    fn test_select_reprompts_on_bad_choice() {
        let mut p = ScriptedPrompter::new(&["9", "2"]);
        assert_eq!(p.select("Job type", &items(), 0).unwrap(), 1);
        assert_eq!(p.notices_of(Notice::Warning), vec!["Enter a number between 1 and 3"]);
        assert_eq!(p.output[1], ">  1. cpu");
    }

    #[test]
    fn test_select_rejects_empty_menu() {
        let mut p = ScriptedPrompter::new(&["1"]);
        assert!(p.select("Queue", &[], 0).is_err());
    }

    #[test]
    fn test_confirm_reprompts() {
        let mut p = ScriptedPrompter::new(&["perhaps", "y"]);
        assert!(p.confirm("Continue?", false).unwrap());
        assert_eq!(p.notices_of(Notice::Warning).len(), 1);
    }

    #[test]
    fn test_term_prompter_reads_lines_and_detects_eof() {
        let reader = Cursor::new(b"first\r\nsecond\n".to_vec());
        let mut p = TermPrompter::new(Term::buffered_stdout(), reader);
        assert_eq!(p.read_line("> ").unwrap(), "first");
        assert_eq!(p.read_line("> ").unwrap(), "second");
        assert!(matches!(p.read_line("> "), Err(WizardError::Cancelled)));
    }
}
