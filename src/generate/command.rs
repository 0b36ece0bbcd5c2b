//! bsub command line assembly

use crate::job::{JobKind, JobSpecification};

/// Accumulates bsub arguments in submission order
#[derive(Debug)]
pub struct CommandBuilder {
    parts: Vec<String>,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self {
            parts: vec!["bsub".to_string()],
        }
    }

    fn push(&mut self, part: impl Into<String>) -> &mut Self {
        self.parts.push(part.into());
        self
    }

    /// Append every flag the job needs, in the scheduler's documented order
    pub fn job(&mut self, spec: &JobSpecification) -> &mut Self {
        if !spec.name.is_empty() {
            self.push(format!(
                "-J \"{}{}\"",
                spec.name,
                spec.batch_config.range_suffix()
            ));
        }

        self.push(format!("-n {}", spec.slots));

        if let Some(queue) = spec.queue_name() {
            self.push(format!("-q {}", queue));
        }
        if let Some(gpu) = spec.gpu_request() {
            self.push(format!("-gpu \"{}\"", gpu.resource_string()));
        }
        if let Some(limit) = spec.runtime_limit_str() {
            self.push(format!("-W {}", limit));
        }
        if let Some(estimate) = spec.runtime_estimate_str() {
            self.push(format!("-We {}", estimate));
        }
        if spec.is_interactive() {
            self.push("-Is");
        }

        match spec.output_path_str() {
            Some(path) => {
                self.push(format!("-o {}", path));
            }
            None if !spec.is_interactive() => {
                self.push("-o /dev/null");
            }
            None => {}
        }
        if let Some(path) = spec.error_path_str() {
            self.push(format!("-e {}", path));
        }

        if spec.notify_on_start {
            self.push("-B");
        }
        if spec.x11_forwarding {
            self.push("-XF");
        }
        if let Some(dir) = spec.working_directory_str() {
            self.push(format!("-cwd \"{}\"", dir));
        }
        if let Some(app) = spec.parallel_environment_str() {
            self.push(format!("-app {}", app));
        }

        for tag in &spec.architecture_tags {
            self.push(format!("-R\"select[{}]\"", tag));
        }
        for (license, count) in &spec.license_requirements {
            self.push(format!("-R\"rusage[{}={}]\"", license, count));
        }
        for expr in &spec.custom_resource_expressions {
            self.push(format!("-R\"{}\"", expr));
        }
        for (name, value) in &spec.environment_overrides {
            self.push(format!("-env \"{}={}\"", name, value));
        }

        if !spec.command.is_empty() {
            if spec.is_interactive() {
                self.push(spec.command.clone());
            } else {
                self.push(format!("'{}'", spec.command));
            }
        }

        self
    }

    /// Space-joined command line
    pub fn build(&self) -> String {
        self.parts.join(" ")
    }
}

/// Build the bsub command line for a job
pub fn build_command(spec: &JobSpecification) -> String {
    CommandBuilder::new().job(spec).build()
}

/// Canned example commands for a job kind
pub fn example_commands(kind: JobKind) -> &'static [&'static str] {
    match kind {
        JobKind::Cpu => &[
            r#"bsub -J "my_cpu_job" -n 4 -o /dev/null 'python my_script.py'"#,
            r#"bsub -J "long_job" -n 16 -W 24:00 -q local -o output.log './my_program'"#,
        ],
        JobKind::Gpu => &[
            r#"bsub -J "gpu_training" -n 12 -gpu "num=1" -q gpu_a100 -o training.log 'python train.py'"#,
            r#"bsub -J "multi_gpu" -n 24 -gpu "num=2:nvlink=yes" -q gpu_h100 -o output.log 'python train_multi.py'"#,
        ],
        JobKind::Interactive => &["bsub -n 1 -Is /bin/bash", "bsub -n 4 -W 8:00 -Is -XF python"],
        JobKind::Mpi => &[
            r#"bsub -n 48 -app parallel-48 -J "mpi_job" -o mpi.log 'mpirun -np 48 my_mpi_program'"#,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{AcceleratorConfig, BatchConfig};

    fn cpu_job() -> JobSpecification {
        let mut spec = JobSpecification::default();
        spec.name = "test_cpu".to_string();
        spec.command = "echo hello".to_string();
        spec.slots = 4;
        spec.queue = Some("local".to_string());
        spec.runtime_limit = Some("1:00".to_string());
        spec
    }

    #[test]
    fn test_default_builder_starts_with_bsub() {
        let spec = cpu_job();
        assert_eq!(CommandBuilder::default().build(), "bsub");
        assert_eq!(CommandBuilder::default().job(&spec).build(), build_command(&spec));
    }

    #[test]
    fn test_simple_cpu_command() {
        assert_eq!(
            build_command(&cpu_job()),
            r#"bsub -J "test_cpu" -n 4 -q local -W 1:00 -o /dev/null 'echo hello'"#
        );
    }

    #[test]
    fn test_gpu_command() {
        let mut spec = JobSpecification::new(JobKind::Gpu);
        spec.name = "train".to_string();
        spec.command = "python train.py".to_string();
        spec.slots = 12;
        spec.queue = Some("gpu_a100".to_string());
        spec.runtime_limit = Some("2:00".to_string());
        spec.accelerator_config = Some(AcceleratorConfig {
            accelerator_id: "NVIDIAA100_SXM4_80GB".to_string(),
            ..Default::default()
        });

        let cmd = build_command(&spec);
        assert!(cmd.contains(r#"-gpu "num=1:gmodel=NVIDIAA100_SXM4_80GB""#), "{}", cmd);
        assert_eq!(
            cmd,
            r#"bsub -J "train" -n 12 -q gpu_a100 -gpu "num=1:gmodel=NVIDIAA100_SXM4_80GB" -W 2:00 -o /dev/null 'python train.py'"#
        );
    }

    #[test]
    fn test_accelerator_config_ignored_for_cpu_kind() {
        let mut spec = cpu_job();
        spec.accelerator_config = Some(AcceleratorConfig::default());
        assert!(!build_command(&spec).contains("-gpu"));
    }

    #[test]
    fn test_array_name_suffix() {
        let mut spec = cpu_job();
        spec.batch_config = BatchConfig::range(1, 100);
        assert!(build_command(&spec).contains(r#"-J "test_cpu[1-100]""#));

        spec.batch_config.step = 2;
        spec.batch_config.max_parallel = Some(5);
        assert!(build_command(&spec).contains(r#"-J "test_cpu[1-100:2]%5""#));
    }

    #[test]
    fn test_interactive_command() {
        let mut spec = JobSpecification::new(JobKind::Interactive);
        spec.command = "/bin/bash".to_string();
        spec.x11_forwarding = true;
        assert_eq!(build_command(&spec), "bsub -n 1 -Is -XF /bin/bash");
    }

    #[test]
    fn test_empty_command_and_name_are_omitted() {
        let spec = JobSpecification::default();
        assert_eq!(build_command(&spec), "bsub -n 1 -o /dev/null");
    }

    #[test]
    fn test_full_flag_order() {
        let mut spec = JobSpecification::new(JobKind::Mpi);
        spec.name = "sim".to_string();
        spec.command = "mpirun ./sim".to_string();
        spec.slots = 96;
        spec.queue = Some("mpi".to_string());
        spec.runtime_limit = Some("12:00".to_string());
        spec.runtime_estimate = Some("10:00".to_string());
        spec.output_path = Some("/groups/lab/out.log".to_string());
        spec.error_path = Some("/groups/lab/err.log".to_string());
        spec.notify_on_start = true;
        spec.working_directory = Some("/groups/lab/run".to_string());
        spec.parallel_environment = Some("parallel-48".to_string());
        spec.architecture_tags = vec!["avx512".to_string()];
        spec.license_requirements.insert("matlab".to_string(), 2);
        spec.custom_resource_expressions = vec!["order[-slots]".to_string()];
        spec.environment_overrides.insert("OMP_NUM_THREADS".to_string(), "1".to_string());

        assert_eq!(
            build_command(&spec),
            concat!(
                r#"bsub -J "sim" -n 96 -q mpi -W 12:00 -We 10:00 "#,
                r#"-o /groups/lab/out.log -e /groups/lab/err.log -B -cwd "/groups/lab/run" "#,
                r#"-app parallel-48 -R"select[avx512]" -R"rusage[matlab=2]" -R"order[-slots]" "#,
                r#"-env "OMP_NUM_THREADS=1" 'mpirun ./sim'"#
            )
        );
    }

    #[test]
    fn test_command_is_deterministic() {
        let mut spec = cpu_job();
        spec.environment_overrides.insert("B".to_string(), "2".to_string());
        spec.environment_overrides.insert("A".to_string(), "1".to_string());
        let first = build_command(&spec);
        assert_eq!(first, build_command(&spec));
        assert!(first.find("-env \"A=1\"").unwrap() < first.find("-env \"B=2\"").unwrap());
    }

    #[test]
    fn test_examples_per_kind() {
        assert_eq!(example_commands(JobKind::Cpu).len(), 2);
        assert_eq!(example_commands(JobKind::Mpi).len(), 1);
        assert!(example_commands(JobKind::Interactive)
            .iter()
            .all(|c| c.contains("-Is")));
    }
}
