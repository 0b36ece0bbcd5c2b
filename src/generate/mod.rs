//! Command, cost and script generation
//!
//! Generation is a pure function of the job and the pricing table:
//! calling [`generate`] twice on the same input yields identical output.

mod command;
mod cost;
mod script;

pub use command::{build_command, example_commands, CommandBuilder};
pub use cost::{estimate_cost, CostEstimate};
pub use script::{default_script_filename, generate_script, write_script};

use crate::cluster::Pricing;
use crate::job::JobSpecification;
use serde::Serialize;

/// Everything produced for one job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated {
    /// Single-line bsub invocation
    pub command: String,
    /// Cost breakdown and total
    pub cost: CostEstimate,
    /// Bash submission script
    pub script: String,
}

/// Produce the command, cost estimate and script for a job
pub fn generate(spec: &JobSpecification, pricing: &Pricing) -> Generated {
    let generated = Generated {
        command: build_command(spec),
        cost: CostEstimate::for_job(spec, pricing),
        script: generate_script(spec),
    };
    tracing::debug!(
        "Generated command for job '{}' ({} chars, est. ${:.2})",
        spec.name,
        generated.command.len(),
        generated.cost.total
    );
    generated
}
