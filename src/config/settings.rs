//! Configuration settings for BSub Wizard
//!
//! CLI arguments, subcommands and the resolved runtime settings.

use crate::cluster::ClusterCatalog;
use crate::error::{Result, WizardError};
use crate::job::JobKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Environment variable set by `--debug`
pub const DEBUG_ENV: &str = "BSUB_WIZARD_DEBUG";

/// BSub Wizard - Interactive guide for creating bsub commands
#[derive(Parser, Debug, Clone)]
#[command(name = "bsub-wizard")]
#[command(author = "BSub Wizard Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interactive guide for creating bsub commands")]
#[command(long_about = r#"
BSub Wizard walks through a job submission step by step and produces a
ready-to-run bsub command, a submission script and a cost estimate.

Steps:
  - Job type (CPU, GPU, Interactive, MPI)
  - Resources (slots, GPUs)
  - Queue selection
  - Runtime, name and command
  - Output files
  - Advanced options (licenses, architecture, environment)
  - Review and export

Examples:
  bsub-wizard                                   # Start the interactive wizard
  bsub-wizard --config my_job.json              # Resume a saved configuration
  bsub-wizard generate my_job.json --script run.sh
  bsub-wizard queues --kind gpu
"#)]
pub struct CliArgs {
    /// Load configuration from JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cluster catalog JSON (built-in Janelia catalog if omitted)
    #[arg(long, env = "BSUB_WIZARD_CATALOG", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Directory for saved configurations and exported scripts
    #[arg(short = 'o', long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug mode (full error chains)
    #[arg(long)]
    pub debug: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate the command and script for a saved configuration
    #[command(name = "generate")]
    Generate {
        /// Saved configuration file
        snapshot: PathBuf,
        /// Write the submission script to this file
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate a saved configuration
    #[command(name = "validate")]
    Validate {
        /// Saved configuration file
        snapshot: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List queues
    #[command(name = "queues")]
    Queues {
        /// Only queues suitable for this job type
        #[arg(short, long, value_enum)]
        kind: Option<JobKind>,
    },

    /// List GPU models
    #[command(name = "accelerators")]
    Accelerators {
        /// Only GPUs offered by this queue
        #[arg(short, long)]
        queue: Option<String>,
    },

    /// Show example commands
    #[command(name = "examples")]
    Examples {
        /// Job type
        #[arg(short, long, value_enum)]
        kind: Option<JobKind>,
    },
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Settings resolved from the command line
#[derive(Debug, Clone)]
pub struct Settings {
    /// Catalog file; `None` selects the built-in catalog
    pub catalog_path: Option<PathBuf>,
    /// Configuration to resume
    pub initial_snapshot: Option<PathBuf>,
    /// Where snapshots and scripts are written
    pub output_dir: PathBuf,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        if let Some(path) = &args.config {
            require_file(path, "Configuration file")?;
        }
        if let Some(path) = &args.catalog {
            require_file(path, "Catalog file")?;
        }
        if args.output_dir.exists() && !args.output_dir.is_dir() {
            return Err(WizardError::config(format!(
                "Output directory is not a directory: {}",
                args.output_dir.display()
            )));
        }

        Ok(Self {
            catalog_path: args.catalog.clone(),
            initial_snapshot: args.config.clone(),
            output_dir: args.output_dir.clone(),
        })
    }

    /// Load the configured catalog
    pub fn load_catalog(&self) -> Result<ClusterCatalog> {
        match &self.catalog_path {
            Some(path) => ClusterCatalog::from_json_file(path),
            None => Ok(ClusterCatalog::default()),
        }
    }

}

/// Tracing level for a `-v` count, used when `RUST_LOG` is unset
pub fn default_log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(WizardError::config(format!("{} not found: {}", what, path.display())))
    }
}
