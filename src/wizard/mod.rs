//! Interactive wizard
//!
//! A console front end over the validator and generator. All user
//! interaction goes through the [`Prompter`] trait so sessions can be
//! driven by a terminal or by a script in tests.

mod editors;
mod prompt;
mod session;

pub use prompt::{parse_choice, parse_yes_no, Notice, Prompter, TermPrompter};
pub use session::{Navigation, Outcome, Wizard};
pub use crate::validate::WizardStep;
