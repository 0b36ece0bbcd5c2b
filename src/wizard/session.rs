//! Wizard session controller
//!
//! Walks the steps in order. After each step the user picks where to go:
//! Enter moves on (only when the step has no errors), `b` goes back, `s`
//! saves a snapshot, `l` loads one, `h` prints help and `q` quits.

use super::prompt::{Notice, Prompter};
use crate::cluster::ClusterCatalog;
use crate::error::{Result, WizardError};
use crate::generate::{default_script_filename, generate, write_script, Generated};
use crate::job::{snapshot, JobSpecification};
use crate::validate::{validate_job, StepReport, WizardStep};
use std::path::PathBuf;

/// Choice made at the end of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Back,
    Save,
    Load,
    Help,
    Quit,
}

impl Navigation {
    /// Parse a navigation answer; empty input means next
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "" | "n" | "next" => Some(Self::Next),
            "b" | "back" => Some(Self::Back),
            "s" | "save" => Some(Self::Save),
            "l" | "load" => Some(Self::Load),
            "h" | "?" | "help" => Some(Self::Help),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The job passed validation and was generated
    Completed(Generated),
    /// The user quit or input closed
    Quit,
}

/// One interactive session editing a single job
pub struct Wizard<'a, P> {
    pub(super) catalog: &'a ClusterCatalog,
    pub(super) prompter: P,
    pub(super) spec: JobSpecification,
    step: WizardStep,
    output_dir: PathBuf,
}

impl<'a, P: Prompter> Wizard<'a, P> {
    /// Fresh session at the first step
    pub fn new(catalog: &'a ClusterCatalog, prompter: P) -> Self {
        Self {
            catalog,
            prompter,
            spec: JobSpecification::default(),
            step: WizardStep::first(),
            output_dir: PathBuf::from("."),
        }
    }

    /// Start from an existing job
    pub fn with_spec(mut self, spec: JobSpecification) -> Self {
        self.spec = spec;
        self
    }

    /// Directory for snapshots and scripts
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn spec(&self) -> &JobSpecification {
        &self.spec
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }

    /// Run the session to completion. Closed input counts as quitting.
    pub fn run(&mut self) -> Result<Outcome> {
        match self.run_steps() {
            Err(WizardError::Cancelled) => {
                tracing::info!("Input closed at {:?}, leaving wizard", self.step);
                Ok(Outcome::Quit)
            }
            other => other,
        }
    }

    fn run_steps(&mut self) -> Result<Outcome> {
        loop {
            self.prompter.print("");
            self.prompter.print(&self.step.to_string());
            self.edit_step(self.step)?;

            let report = self.step.check(&self.spec, self.catalog);
            self.show_report(&report);

            loop {
                match self.navigate()? {
                    Navigation::Next if !report.is_ok() => {
                        self.prompter
                            .notify(Notice::Error, "Fix the errors above before continuing");
                        break;
                    }
                    Navigation::Next => {
                        if let Some(next) = self.step.next() {
                            tracing::debug!("Advancing from {:?} to {:?}", self.step, next);
                            self.step = next;
                        } else if let Some(generated) = self.finish()? {
                            return Ok(Outcome::Completed(generated));
                        }
                        break;
                    }
                    Navigation::Back => {
                        match self.step.previous() {
                            Some(previous) => self.step = previous,
                            None => self.prompter.notify(Notice::Info, "Already at the first step"),
                        }
                        break;
                    }
                    Navigation::Save => self.save(),
                    Navigation::Load => {
                        if self.load()? {
                            break;
                        }
                    }
                    Navigation::Help => self.show_help(),
                    Navigation::Quit => return Ok(Outcome::Quit),
                }
            }
        }
    }

    fn navigate(&mut self) -> Result<Navigation> {
        loop {
            let line = self
                .prompter
                .read_line("[Enter] next  [b] back  [s] save  [l] load  [h] help  [q] quit: ")?;
            match Navigation::parse(&line) {
                Some(nav) => return Ok(nav),
                None => self.prompter.notify(Notice::Warning, &format!("Unknown choice: {}", line.trim())),
            }
        }
    }

    fn show_report(&mut self, report: &StepReport) {
        for warning in &report.warnings {
            self.prompter.notify(Notice::Warning, warning);
        }
        for error in &report.errors {
            self.prompter.notify(Notice::Error, error);
        }
    }

    fn show_help(&mut self) {
        let lines = [
            "Enter  continue to the next step (blocked while the step has errors)",
            "b      go back one step",
            "s      save the current configuration as JSON",
            "l      load a saved configuration",
            "q      quit without generating",
            "At a field prompt, Enter keeps the value in brackets and '-' clears it.",
        ];
        for line in lines {
            self.prompter.print(line);
        }
    }

    /// Save a snapshot; failures are reported and the session goes on
    pub fn save(&mut self) {
        let path = self.output_dir.join(snapshot::default_filename(&self.spec));
        match snapshot::save_file(&self.spec, &path) {
            Ok(()) => self
                .prompter
                .notify(Notice::Success, &format!("Configuration saved to {}", path.display())),
            Err(e) => {
                tracing::warn!("Saving configuration failed: {}", e);
                self.prompter
                    .notify(Notice::Error, &format!("Could not save configuration: {}", e));
            }
        }
    }

    /// Ask for a snapshot and replace the job with it. Returns true if loaded.
    fn load(&mut self) -> Result<bool> {
        let default = self.output_dir.join(snapshot::default_filename(&self.spec));
        let answer = self
            .prompter
            .input("Configuration file", &default.display().to_string())?;

        match snapshot::load_file(&PathBuf::from(&answer)) {
            Ok(spec) => {
                self.spec = spec;
                self.prompter
                    .notify(Notice::Success, &format!("Loaded configuration from {}", answer));
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Loading configuration failed: {}", e);
                self.prompter
                    .notify(Notice::Error, &format!("Could not load configuration: {}", e));
                Ok(false)
            }
        }
    }

    /// Full validation, then generation and optional script export
    fn finish(&mut self) -> Result<Option<Generated>> {
        let report = validate_job(&self.spec, self.catalog);
        if !report.is_ok() {
            for error in &report.errors {
                self.prompter.notify(Notice::Error, error);
            }
            return Ok(None);
        }

        let generated = generate(&self.spec, &self.catalog.pricing);
        self.prompter.notify(Notice::Success, "Command ready");
        self.prompter.print(&generated.command);

        let path = self.output_dir.join(default_script_filename(&self.spec));
        let prompt = format!("Export submission script to {}?", path.display());
        if self.prompter.confirm(&prompt, true)? {
            match write_script(&generated.script, &path) {
                Ok(()) => self
                    .prompter
                    .notify(Notice::Success, &format!("Script written to {}", path.display())),
                Err(e) => {
                    tracing::warn!("Script export failed: {}", e);
                    self.prompter
                        .notify(Notice::Error, &format!("Could not write script: {}", e));
                }
            }
        }

        Ok(Some(generated))
    }
}
