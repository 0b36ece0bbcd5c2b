//! Error types for BSub Wizard
//!
//! Validation problems are not errors: they are reported as
//! [`RuleViolation`](crate::validate::RuleViolation)s inside a step report.
//! The types here cover the I/O boundary (snapshots, catalog files, script
//! export) and the interactive front end.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for BSub Wizard operations
#[derive(Error, Debug)]
pub enum WizardError {
    /// I/O error while reading or writing a file
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be parsed or serialized
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Cluster catalog file is malformed or inconsistent
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The job failed the full validation pass
    #[error("Job configuration has {count} error(s): {}", reasons.join("; "))]
    InvalidJob { count: usize, reasons: Vec<String> },

    /// Input stream closed or the user quit
    #[error("Wizard cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<WizardError>,
    },
}

impl WizardError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid-job error from a list of reasons
    pub fn invalid_job(reasons: Vec<String>) -> Self {
        Self::InvalidJob {
            count: reasons.len(),
            reasons,
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for errors the session can shrug off and keep going
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { .. } | Self::Snapshot(_) | Self::InvalidJob { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::WithContext { source, .. } => source.path(),
            _ => None,
        }
    }
}

/// Result type alias for BSub Wizard operations
pub type Result<T> = std::result::Result<T, WizardError>;

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| WizardError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = WizardError::io("/tmp/job.json", io_err);
        assert_eq!(err.path(), Some(&PathBuf::from("/tmp/job.json")));
        assert!(err.to_string().contains("/tmp/job.json"));
    }

    #[test]
    fn test_context_keeps_path_and_recoverability() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = WizardError::io("/groups/lab/job.sh", io_err).with_context("Export failed");
        assert!(err.is_recoverable());
        assert_eq!(err.path(), Some(&PathBuf::from("/groups/lab/job.sh")));
        assert!(err.to_string().starts_with("Export failed"));
    }

    #[test]
    fn test_invalid_job_message() {
        let err = WizardError::invalid_job(vec![
            "Job name is required".to_string(),
            "Command is required".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Job configuration has 2 error(s): Job name is required; Command is required"
        );
        assert!(!WizardError::Cancelled.is_recoverable());
    }

    #[test]
    fn test_io_result_ext() {
        let res: std::io::Result<()> = Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = res.with_path("/scratch/x").unwrap_err();
        assert!(matches!(err, WizardError::Io { .. }));
    }
}
