//! Job specification data model
//!
//! One [`JobSpecification`] lives for the whole wizard session. It is
//! filled in step by step, checked by the validator, and finally read by
//! the generator.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// GPU model a new GPU job starts with
pub const DEFAULT_ACCELERATOR: &str = "NVIDIAA100_SXM4_80GB";

/// Top-level job category
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Batch CPU job
    #[default]
    Cpu,
    /// Batch job with accelerators
    Gpu,
    /// Interactive shell session (`-Is`)
    Interactive,
    /// Parallel MPI job
    Mpi,
}

impl JobKind {
    /// All kinds, in the order the wizard offers them
    pub const ALL: [JobKind; 4] = [JobKind::Cpu, JobKind::Gpu, JobKind::Interactive, JobKind::Mpi];

    /// Lowercase identifier used in scripts and snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Interactive => "interactive",
            Self::Mpi => "mpi",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Interactive => "Interactive",
            Self::Mpi => "MPI",
        }
    }

    /// Parse the lowercase identifier; `None` for anything else
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GPU compute-mode sharing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SharingMode {
    /// Several processes may share a GPU
    Shared,
    /// One process per GPU (scheduler default)
    #[default]
    ExclusiveProcess,
}

impl SharingMode {
    /// Value used in the `-gpu` resource string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::ExclusiveProcess => "exclusive_process",
        }
    }
}

/// Accelerator request, present only for GPU jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceleratorConfig {
    /// Catalog accelerator ID (`gmodel`)
    pub accelerator_id: String,
    /// Number of GPUs
    pub unit_count: u32,
    /// Compute mode
    pub sharing_mode: SharingMode,
    /// Enable CUDA multi-process service
    pub multi_process_service: bool,
    /// Require NVLink-connected GPUs
    pub nvlink: bool,
    /// Minimum GPU memory (e.g. "40G")
    pub minimum_memory: Option<String>,
    /// Job-exclusive GPUs
    pub exclusive_job: bool,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            accelerator_id: String::new(),
            unit_count: 1,
            sharing_mode: SharingMode::ExclusiveProcess,
            multi_process_service: false,
            nvlink: false,
            minimum_memory: None,
            exclusive_job: true,
        }
    }
}

impl AcceleratorConfig {
    /// Build the colon-separated value of the `-gpu` flag
    pub fn resource_string(&self) -> String {
        let mut parts = vec![format!("num={}", self.unit_count)];

        if self.sharing_mode != SharingMode::ExclusiveProcess {
            parts.push(format!("mode={}", self.sharing_mode.as_str()));
        }
        if self.multi_process_service {
            parts.push("mps=yes".to_string());
        }
        if !self.exclusive_job {
            parts.push("j_exclusive=no".to_string());
        }
        if !self.accelerator_id.is_empty() {
            parts.push(format!("gmodel={}", self.accelerator_id));
        }
        if let Some(ref mem) = self.minimum_memory {
            if !mem.is_empty() {
                parts.push(format!("gmem={}", mem));
            }
        }
        if self.nvlink {
            parts.push("nvlink=yes".to_string());
        }

        parts.join(":")
    }
}

/// Job-array settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Whether the job is an array
    pub enabled: bool,
    /// First index
    pub start_index: u32,
    /// Last index
    pub end_index: u32,
    /// Index increment
    pub step: u32,
    /// Maximum concurrently running tasks
    pub max_parallel: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_index: 1,
            end_index: 1,
            step: 1,
            max_parallel: None,
        }
    }
}

impl BatchConfig {
    /// An enabled range with step 1
    pub fn range(start_index: u32, end_index: u32) -> Self {
        Self {
            enabled: true,
            start_index,
            end_index,
            ..Default::default()
        }
    }

    /// Suffix appended to the job name: `[1-100]`, `[1-100:2]%10`
    pub fn range_suffix(&self) -> String {
        if !self.enabled {
            return String::new();
        }

        let mut spec = if self.step == 1 {
            format!("[{}-{}]", self.start_index, self.end_index)
        } else {
            format!("[{}-{}:{}]", self.start_index, self.end_index, self.step)
        };

        if let Some(max) = self.max_parallel {
            if max > 0 {
                spec.push_str(&format!("%{}", max));
            }
        }

        spec
    }

    /// Number of tasks in the array: `(end - start) / step + 1`
    pub fn task_count(&self) -> i64 {
        let step = self.step.max(1) as i64;
        (self.end_index as i64 - self.start_index as i64).div_euclid(step) + 1
    }

    /// Multiplier applied to the cost estimate: `(end - start + 1) / step`.
    ///
    /// Differs from [`task_count`](Self::task_count) when `step > 1`.
    pub fn cost_multiplier(&self) -> i64 {
        if !self.enabled {
            return 1;
        }
        let step = self.step.max(1) as i64;
        (self.end_index as i64 - self.start_index as i64 + 1).div_euclid(step)
    }
}

/// Everything needed to build one `bsub` invocation
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpecification {
    /// Job category
    pub job_kind: JobKind,
    /// Job name (`-J`)
    pub name: String,
    /// Command to run
    pub command: String,
    /// CPU slots (`-n`)
    pub slots: u32,
    /// Queue name (`-q`)
    pub queue: Option<String>,
    /// Hard runtime limit (`-W`)
    pub runtime_limit: Option<String>,
    /// Runtime estimate (`-We`)
    pub runtime_estimate: Option<String>,
    /// GPU request
    pub accelerator_config: Option<AcceleratorConfig>,
    /// stdout file (`-o`)
    pub output_path: Option<String>,
    /// stderr file (`-e`)
    pub error_path: Option<String>,
    /// Working directory (`-cwd`)
    pub working_directory: Option<String>,
    /// Mail on completion
    pub notify_on_complete: bool,
    /// Mail on start (`-B`)
    pub notify_on_start: bool,
    /// X11 forwarding (`-XF`)
    pub x11_forwarding: bool,
    /// Job array
    pub batch_config: BatchConfig,
    /// CPU feature requirements (`-R"select[..]"`)
    pub architecture_tags: Vec<String>,
    /// Licenses (`-R"rusage[name=count]"`)
    pub license_requirements: BTreeMap<String, u32>,
    /// Free-form `-R` expressions
    pub custom_resource_expressions: Vec<String>,
    /// Environment (`-env`)
    pub environment_overrides: BTreeMap<String, String>,
    /// Application profile (`-app`), MPI jobs
    pub parallel_environment: Option<String>,
}

impl Default for JobSpecification {
    fn default() -> Self {
        Self::new(JobKind::Cpu)
    }
}

impl JobSpecification {
    /// Empty specification of the given kind
    pub fn new(job_kind: JobKind) -> Self {
        let mut spec = Self {
            job_kind,
            name: String::new(),
            command: String::new(),
            slots: 1,
            queue: None,
            runtime_limit: None,
            runtime_estimate: None,
            accelerator_config: None,
            output_path: None,
            error_path: None,
            working_directory: None,
            notify_on_complete: false,
            notify_on_start: false,
            x11_forwarding: false,
            batch_config: BatchConfig::default(),
            architecture_tags: Vec::new(),
            license_requirements: BTreeMap::new(),
            custom_resource_expressions: Vec::new(),
            environment_overrides: BTreeMap::new(),
            parallel_environment: None,
        };
        spec.ensure_accelerator_config();
        spec
    }

    /// Switch the job kind. A GPU job gets a default accelerator request
    /// if it has none.
    pub fn set_job_kind(&mut self, job_kind: JobKind) {
        self.job_kind = job_kind;
        self.ensure_accelerator_config();
    }

    /// Switch the job kind and fill in that kind's starting values:
    /// slots, queue, a placeholder command if none is set, and the GPU,
    /// runtime or parallel-environment settings the kind needs.
    pub fn apply_kind_defaults(&mut self, job_kind: JobKind) {
        self.set_job_kind(job_kind);
        let (slots, queue, command) = match job_kind {
            JobKind::Cpu => (4, "local", "python my_script.py"),
            JobKind::Gpu => (12, "gpu_a100", "python train.py"),
            JobKind::Interactive => (1, "interactive", "/bin/bash"),
            JobKind::Mpi => (48, "mpi", "mpirun -np 48 my_mpi_program"),
        };
        self.slots = slots;
        self.queue = Some(queue.to_string());
        if self.command.trim().is_empty() {
            self.command = command.to_string();
        }

        match job_kind {
            JobKind::Gpu => {
                let gpu = self.accelerator_config.get_or_insert_with(AcceleratorConfig::default);
                if gpu.accelerator_id.is_empty() {
                    gpu.accelerator_id = DEFAULT_ACCELERATOR.to_string();
                    gpu.unit_count = 1;
                }
            }
            JobKind::Interactive => self.runtime_limit = Some("8:00".to_string()),
            JobKind::Mpi => self.parallel_environment = Some("parallel-48".to_string()),
            JobKind::Cpu => {}
        }
    }

    fn ensure_accelerator_config(&mut self) {
        if self.job_kind == JobKind::Gpu && self.accelerator_config.is_none() {
            self.accelerator_config = Some(AcceleratorConfig::default());
        }
    }

    /// True for `-Is` sessions
    pub fn is_interactive(&self) -> bool {
        self.job_kind == JobKind::Interactive
    }

    /// Accelerator request if this is a GPU job
    pub fn gpu_request(&self) -> Option<&AcceleratorConfig> {
        match self.job_kind {
            JobKind::Gpu => self.accelerator_config.as_ref(),
            _ => None,
        }
    }

    /// Queue name, treating an empty string as unset
    pub fn queue_name(&self) -> Option<&str> {
        non_empty(&self.queue)
    }

    /// Runtime limit, treating an empty string as unset
    pub fn runtime_limit_str(&self) -> Option<&str> {
        non_empty(&self.runtime_limit)
    }

    /// Runtime estimate, treating an empty string as unset
    pub fn runtime_estimate_str(&self) -> Option<&str> {
        non_empty(&self.runtime_estimate)
    }

    /// stdout path, treating an empty string as unset
    pub fn output_path_str(&self) -> Option<&str> {
        non_empty(&self.output_path)
    }

    /// stderr path, treating an empty string as unset
    pub fn error_path_str(&self) -> Option<&str> {
        non_empty(&self.error_path)
    }

    /// Working directory, treating an empty string as unset
    pub fn working_directory_str(&self) -> Option<&str> {
        non_empty(&self.working_directory)
    }

    /// Parallel environment, treating an empty string as unset
    pub fn parallel_environment_str(&self) -> Option<&str> {
        non_empty(&self.parallel_environment)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
