//! Per-step rule sets
//!
//! Each wizard step owns one [`StepRules`] implementor. The wizard picks it
//! by position with [`WizardStep::rules`] and blocks on errors; warnings
//! are shown but never block.

use super::rules::{self, RuleResult, DEFAULT_MAX_GPUS};
use crate::cluster::ClusterCatalog;
use crate::error::{Result, WizardError};
use crate::generate::estimate_cost;
use crate::job::{JobKind, JobSpecification, Runtime};
use serde::Serialize;
use std::fmt;

/// Above this total the review step flags the job
pub const HIGH_COST_THRESHOLD: f64 = 100.0;

/// Above this total an array job gets a second warning
pub const HIGH_ARRAY_COST_THRESHOLD: f64 = 1000.0;

/// License counts above this are flagged
pub const HIGH_LICENSE_COUNT: u32 = 100;

/// Outcome of checking one step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Blocking problems
    pub errors: Vec<String>,
    /// Advisory notes
    pub warnings: Vec<String>,
}

impl StepReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing blocks advancement
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record a failed rule, prefixed with the field it concerns
    fn check(&mut self, field: Option<&str>, result: RuleResult) {
        if let Err(violation) = result {
            match field {
                Some(field) => self.errors.push(format!("{}: {}", field, violation)),
                None => self.errors.push(violation.to_string()),
            }
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another report in, skipping messages already present
    pub fn merge(&mut self, other: StepReport) {
        for error in other.errors {
            if !self.errors.contains(&error) {
                self.errors.push(error);
            }
        }
        for warning in other.warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
    }

    /// Turn blocking errors into a [`WizardError::InvalidJob`]
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(WizardError::invalid_job(self.errors))
        }
    }
}

/// Checks attached to one wizard step
pub trait StepRules {
    /// Check the parts of the job this step edits
    fn check(&self, spec: &JobSpecification, catalog: &ClusterCatalog) -> StepReport;
}

/// Wizard steps in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WizardStep {
    Welcome,
    JobType,
    Resources,
    Queue,
    Runtime,
    Files,
    Advanced,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 8] = [
        Self::Welcome,
        Self::JobType,
        Self::Resources,
        Self::Queue,
        Self::Runtime,
        Self::Files,
        Self::Advanced,
        Self::Review,
    ];

    /// Zero-based position
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Step at a zero-based position
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn first() -> Self {
        Self::Welcome
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    /// Get human-readable title
    pub fn title(&self) -> &'static str {
        match self {
            Self::Welcome => "Welcome",
            Self::JobType => "Job Type",
            Self::Resources => "Resources",
            Self::Queue => "Queue",
            Self::Runtime => "Runtime & Command",
            Self::Files => "Files",
            Self::Advanced => "Advanced Options",
            Self::Review => "Review",
        }
    }

    /// Rule set for this step
    pub fn rules(&self) -> &'static dyn StepRules {
        match self {
            Self::Welcome => &WelcomeRules,
            Self::JobType => &JobTypeRules,
            Self::Resources => &ResourceRules,
            Self::Queue => &QueueRules,
            Self::Runtime => &RuntimeRules,
            Self::Files => &FileRules,
            Self::Advanced => &AdvancedRules,
            Self::Review => &ReviewRules,
        }
    }

    /// Run this step's rules
    pub fn check(&self, spec: &JobSpecification, catalog: &ClusterCatalog) -> StepReport {
        self.rules().check(spec, catalog)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}/{}: {}", self.index() + 1, Self::ALL.len(), self.title())
    }
}

/// Full check run before generation: every step, errors de-duplicated
pub fn validate_job(spec: &JobSpecification, catalog: &ClusterCatalog) -> StepReport {
    let mut report = StepReport::new();
    for step in WizardStep::ALL {
        report.merge(step.check(spec, catalog));
    }
    tracing::debug!(
        "Validated job '{}': {} error(s), {} warning(s)",
        spec.name,
        report.errors.len(),
        report.warnings.len()
    );
    report
}

pub struct WelcomeRules;

impl StepRules for WelcomeRules {
    fn check(&self, _spec: &JobSpecification, _catalog: &ClusterCatalog) -> StepReport {
        StepReport::new()
    }
}

/// The kind is an enum, so any value is valid
pub struct JobTypeRules;

impl StepRules for JobTypeRules {
    fn check(&self, _spec: &JobSpecification, _catalog: &ClusterCatalog) -> StepReport {
        StepReport::new()
    }
}

pub struct ResourceRules;

impl StepRules for ResourceRules {
    fn check(&self, spec: &JobSpecification, catalog: &ClusterCatalog) -> StepReport {
        let mut report = StepReport::new();
        report.check(None, rules::validate_slots(spec.slots, catalog.pricing.max_slots_per_node));

        if spec.job_kind == JobKind::Gpu {
            match &spec.accelerator_config {
                None => report.error("GPU configuration is required for GPU jobs"),
                Some(gpu) => {
                    report.check(None, rules::validate_gpu_count(gpu.unit_count, DEFAULT_MAX_GPUS));
                    if gpu.accelerator_id.is_empty() {
                        report.error("GPU type selection is required");
                    }
                    if let Some(mem) = &gpu.minimum_memory {
                        report.check(Some("GPU memory"), rules::validate_memory(mem));
                    }
                }
            }
        }

        report
    }
}

pub struct QueueRules;

impl StepRules for QueueRules {
    fn check(&self, spec: &JobSpecification, catalog: &ClusterCatalog) -> StepReport {
        let mut report = StepReport::new();

        let Some(name) = spec.queue_name() else {
            report.error("Please select a queue");
            return report;
        };
        let Some(queue) = catalog.queue(name) else {
            report.error(format!("Unknown queue: {}", name));
            return report;
        };

        if let (Some(max), Some(limit)) = (queue.max_runtime, spec.runtime_limit_str()) {
            if let Ok(requested) = limit.parse::<Runtime>() {
                if requested.total_minutes() > max.total_minutes() {
                    report.warn(format!(
                        "Requested runtime ({}) exceeds queue limit ({})",
                        limit, max
                    ));
                }
            }
        }

        if let Some(max) = queue.max_slots_per_job {
            if spec.slots > max {
                report.warn(format!(
                    "Requested slots ({}) exceeds queue limit ({})",
                    spec.slots, max
                ));
            }
        }

        match (spec.job_kind == JobKind::Gpu, queue.has_accelerators()) {
            (true, false) => report.warn("This queue does not support GPU jobs"),
            (false, true) => report.warn("This is a GPU queue but your job type is not GPU"),
            _ => {}
        }

        report
    }
}

pub struct RuntimeRules;

impl StepRules for RuntimeRules {
    fn check(&self, spec: &JobSpecification, _catalog: &ClusterCatalog) -> StepReport {
        let mut report = StepReport::new();
        report.check(Some("Job name"), rules::validate_name(&spec.name));
        report.check(Some("Command"), rules::validate_command(&spec.command));

        if let Some(limit) = spec.runtime_limit_str() {
            report.check(Some("Runtime limit"), rules::validate_time(limit));
        }
        if let Some(estimate) = spec.runtime_estimate_str() {
            report.check(Some("Runtime estimate"), rules::validate_time(estimate));
        }

        let batch = &spec.batch_config;
        if batch.enabled {
            report.check(
                Some("Array job"),
                rules::validate_batch_range(
                    batch.start_index as i64,
                    batch.end_index as i64,
                    batch.step as i64,
                ),
            );
        }

        report
    }
}

pub struct FileRules;

impl FileRules {
    fn under_roots(path: &str, roots: &[String], allow_dev: bool) -> bool {
        roots.is_empty()
            || roots.iter().any(|root| path.starts_with(root.as_str()))
            || (allow_dev && path.starts_with("/dev"))
    }

    fn roots_hint(roots: &[String]) -> String {
        match roots {
            [] => String::new(),
            [only] => only.clone(),
            [init @ .., last] => format!("{}, or {}", init.join(", "), last),
        }
    }
}

impl StepRules for FileRules {
    fn check(&self, spec: &JobSpecification, catalog: &ClusterCatalog) -> StepReport {
        let mut report = StepReport::new();
        let roots = &catalog.storage_roots;
        let hint = Self::roots_hint(roots);

        let paths = [
            ("Output file", spec.output_path_str(), true),
            ("Error file", spec.error_path_str(), true),
            ("Working directory", spec.working_directory_str(), false),
        ];

        for (label, path, allow_dev) in paths {
            let Some(path) = path else { continue };
            match rules::validate_file_path(path, true) {
                Err(violation) => report.error(format!("{}: {}", label, violation)),
                Ok(()) if !Self::under_roots(path, roots, allow_dev) => {
                    report.warn(format!("{} should typically be in {}", label, hint));
                }
                Ok(()) => {}
            }
        }

        if let (Some(out), Some(err)) = (spec.output_path_str(), spec.error_path_str()) {
            if out == err {
                report.warn("Output and error files are the same - outputs will be mixed");
            }
        }

        if spec.batch_config.enabled {
            let streams = [
                ("output file", spec.output_path_str()),
                ("error file", spec.error_path_str()),
            ];
            for (label, path) in streams {
                if let Some(path) = path {
                    if path != "/dev/null" && !path.contains("$LSB_JOBINDEX") {
                        report.warn(format!(
                            "Array job {} should include $LSB_JOBINDEX to avoid conflicts",
                            label
                        ));
                    }
                }
            }
        }

        report
    }
}

pub struct AdvancedRules;

impl StepRules for AdvancedRules {
    fn check(&self, spec: &JobSpecification, catalog: &ClusterCatalog) -> StepReport {
        let mut report = StepReport::new();

        for expr in &spec.custom_resource_expressions {
            if expr.trim().is_empty() {
                report.error("Empty custom resource expression");
            } else if !["select[", "rusage[", "order["]
                .iter()
                .any(|prefix| expr.starts_with(prefix))
            {
                report.warn(format!(
                    "Custom resource '{}' may not be a valid LSF expression",
                    expr
                ));
            }
        }

        for (license, &count) in &spec.license_requirements {
            if count < 1 {
                report.error(format!("{} license count must be at least 1", license.to_uppercase()));
            } else if count > HIGH_LICENSE_COUNT {
                report.warn(format!(
                    "{} license count ({}) is very high",
                    license.to_uppercase(),
                    count
                ));
            }
        }

        for tag in &spec.architecture_tags {
            if !catalog.architecture_options.contains(tag) {
                report.warn(format!("Unknown architecture requirement: {}", tag));
            }
        }

        for (name, value) in &spec.environment_overrides {
            report.check(
                Some(format!("Environment variable {}", name).as_str()),
                rules::validate_environment_variable(name, value),
            );
        }

        if spec.job_kind == JobKind::Mpi {
            report.check(
                None,
                rules::validate_parallel_environment(spec.parallel_environment_str(), spec.slots),
            );
        }

        report
    }
}

/// Advisory only
pub struct ReviewRules;

impl StepRules for ReviewRules {
    fn check(&self, spec: &JobSpecification, catalog: &ClusterCatalog) -> StepReport {
        let mut report = StepReport::new();

        if spec.runtime_limit_str().is_none() {
            report.warn("No runtime limit set - job may run indefinitely");
        }
        if let (Some(out), Some(err)) = (spec.output_path_str(), spec.error_path_str()) {
            if out == err {
                report.warn("Output and error files are the same");
            }
        }

        let cost = estimate_cost(spec, &catalog.pricing);
        if cost > HIGH_COST_THRESHOLD {
            report.warn(format!("High cost job (${:.2}) - please verify requirements", cost));
        }
        if spec.batch_config.enabled && cost > HIGH_ARRAY_COST_THRESHOLD {
            report.warn("Array job has very high estimated cost");
        }

        report
    }
}
