//! # BSub Wizard - bsub command builder for LSF clusters
//!
//! BSub Wizard turns a structured job description into a ready-to-run
//! `bsub` command line, a submission script and a cost estimate. An
//! interactive console wizard collects the description step by step and
//! checks each step before moving on.
//!
//! ## Features
//!
//! - **Job types**: CPU, GPU, interactive and MPI jobs
//! - **Cluster catalog**: Queues, GPU models, node classes and pricing
//! - **Step validation**: Blocking errors and advisory warnings per step
//! - **Command generation**: Deterministic flag order, job arrays, GPU requests
//! - **Cost estimation**: Slot and GPU charges with array multipliers
//! - **Snapshots**: Save and resume a job as JSON
//!
//! ## Quick Start
//!
//! ```no_run
//! use bsub_wizard::prelude::*;
//!
//! let catalog = ClusterCatalog::default();
//!
//! let mut spec = JobSpecification::new(JobKind::Cpu);
//! spec.name = "align".to_string();
//! spec.command = "python align.py".to_string();
//! spec.slots = 4;
//! spec.queue = Some("local".to_string());
//! spec.runtime_limit = Some("2:00".to_string());
//!
//! let report = validate_job(&spec, &catalog);
//! assert!(report.is_ok());
//!
//! let generated = generate(&spec, &catalog.pricing);
//! println!("{}", generated.command);
//! println!("Estimated cost: ${:.2}", generated.cost.total);
//! ```
//!
//! ## Interactive Session
//!
//! ```no_run
//! use bsub_wizard::cluster::ClusterCatalog;
//! use bsub_wizard::wizard::{Outcome, TermPrompter, Wizard};
//!
//! let catalog = ClusterCatalog::default();
//! let mut wizard = Wizard::new(&catalog, TermPrompter::stdio());
//!
//! if let Outcome::Completed(generated) = wizard.run().unwrap() {
//!     println!("{}", generated.script);
//! }
//! ```

#![warn(clippy::all)]

pub mod cluster;
pub mod config;
pub mod error;
pub mod generate;
pub mod job;
pub mod validate;
pub mod wizard;

// Re-export commonly used types
pub use cluster::ClusterCatalog;
pub use error::{Result, WizardError};
pub use generate::{generate, Generated};
pub use job::{JobKind, JobSpecification};
pub use validate::{validate_job, StepReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use bsub_wizard::prelude::*;
    //! ```

    pub use crate::cluster::{AcceleratorInfo, ClusterCatalog, Pricing, QueueInfo};
    pub use crate::error::{Result, WizardError};
    pub use crate::generate::{build_command, generate, CostEstimate, Generated};
    pub use crate::job::{AcceleratorConfig, BatchConfig, JobKind, JobSpecification, Runtime};
    pub use crate::validate::{validate_job, StepReport, WizardStep};
    pub use crate::wizard::{Outcome, Prompter, TermPrompter, Wizard};
}
