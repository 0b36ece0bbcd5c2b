//! Field prompts for each step

use super::prompt::{Notice, Prompter};
use super::session::Wizard;
use crate::error::Result;
use crate::generate::{build_command, example_commands, CostEstimate};
use crate::job::{AcceleratorConfig, JobKind, JobSpecification, Runtime, SharingMode};
use crate::validate::rules::PARALLEL_48;
use crate::validate::WizardStep;
use std::collections::BTreeMap;

/// Typed at a prompt to clear an optional value
const CLEAR: &str = "-";

fn describe(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Cpu => "Standard batch job on CPU cores",
        JobKind::Gpu => "Batch job using one or more GPUs",
        JobKind::Interactive => "Interactive shell or GUI session",
        JobKind::Mpi => "Parallel job spanning several nodes",
    }
}

/// Split `a=1, b=2` into pairs; the offending entry is returned on error
fn parse_pairs(line: &str) -> std::result::Result<Vec<(String, String)>, String> {
    line.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(entry.to_string()),
        })
        .collect()
}

fn split_list(line: &str, separator: char) -> Vec<String> {
    line.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl<P: Prompter> Wizard<'_, P> {
    pub(super) fn edit_step(&mut self, step: WizardStep) -> Result<()> {
        match step {
            WizardStep::Welcome => self.welcome(),
            WizardStep::JobType => self.edit_job_type(),
            WizardStep::Resources => self.edit_resources(),
            WizardStep::Queue => self.edit_queue(),
            WizardStep::Runtime => self.edit_runtime(),
            WizardStep::Files => self.edit_files(),
            WizardStep::Advanced => self.edit_advanced(),
            WizardStep::Review => self.review(),
        }
    }

    fn ask_number(&mut self, prompt: &str, current: u32) -> Result<u32> {
        loop {
            let answer = self.prompter.input(prompt, &current.to_string())?;
            match answer.parse::<u32>() {
                Ok(n) => return Ok(n),
                Err(_) => self
                    .prompter
                    .notify(Notice::Warning, &format!("Not a whole number: {}", answer)),
            }
        }
    }

    /// Optional text; `-` clears
    fn ask_optional(&mut self, prompt: &str, current: Option<&str>) -> Result<Option<String>> {
        let answer = self.prompter.input(prompt, current.unwrap_or(""))?;
        Ok(match answer.as_str() {
            "" | CLEAR => None,
            _ => Some(answer),
        })
    }

    fn welcome(&mut self) -> Result<()> {
        let catalog = self.catalog;
        self.prompter.print(&format!("BSub Wizard for the {}", catalog.name));
        self.prompter.print(&format!(
            "{} queues, {} GPU models. Answer each prompt or press Enter to keep the value shown.",
            catalog.queues.len(),
            catalog.accelerators.len()
        ));
        if !self.spec.name.is_empty() {
            self.prompter
                .notify(Notice::Info, &format!("Editing saved job '{}'", self.spec.name));
        }
        Ok(())
    }

    fn edit_job_type(&mut self) -> Result<()> {
        let items: Vec<String> = JobKind::ALL
            .iter()
            .map(|kind| format!("{:<12} {}", kind.name(), describe(*kind)))
            .collect();
        let current = JobKind::ALL
            .iter()
            .position(|k| *k == self.spec.job_kind)
            .unwrap_or(0);

        let choice = self.prompter.select("Job type:", &items, current)?;
        let kind = JobKind::ALL[choice];
        // a resumed job keeps its values unless the kind changes
        if kind != self.spec.job_kind || self.spec == JobSpecification::default() {
            tracing::debug!("Applying {} job defaults", kind.name());
            self.spec.apply_kind_defaults(kind);
        }

        self.prompter.print("Examples:");
        for example in example_commands(kind) {
            self.prompter.print(&format!("  {}", example));
        }
        Ok(())
    }

    fn edit_resources(&mut self) -> Result<()> {
        let catalog = self.catalog;
        let pricing = &catalog.pricing;
        self.spec.slots = self.ask_number(
            &format!("Number of slots (1-{})", pricing.max_slots_per_node),
            self.spec.slots,
        )?;
        self.prompter.print(&format!(
            "Memory: {} GB per slot, {} GB total",
            pricing.memory_gb_per_slot,
            self.spec.slots as u64 * pricing.memory_gb_per_slot as u64
        ));

        if self.spec.job_kind == JobKind::Gpu {
            let gpu = self.edit_accelerator()?;
            self.spec.accelerator_config = Some(gpu);
        }
        Ok(())
    }

    fn edit_accelerator(&mut self) -> Result<AcceleratorConfig> {
        let catalog = self.catalog;
        let mut gpu = self.spec.accelerator_config.clone().unwrap_or_default();

        if catalog.accelerators.is_empty() {
            self.prompter.notify(Notice::Warning, "The catalog lists no GPU models");
        } else {
            let items: Vec<String> = catalog
                .accelerators
                .iter()
                .map(|a| {
                    format!(
                        "{:<24} {:>4} GPUs  ${:.2}/GPU-hour",
                        a.display_name(),
                        a.total_units,
                        catalog.pricing.accelerator_rate(&a.id)
                    )
                })
                .collect();
            let current = catalog
                .accelerators
                .iter()
                .position(|a| a.id == gpu.accelerator_id)
                .unwrap_or(0);
            let choice = self.prompter.select("GPU model:", &items, current)?;
            gpu.accelerator_id = catalog.accelerators[choice].id.clone();
        }

        gpu.unit_count = self.ask_number("Number of GPUs", gpu.unit_count)?;

        let shared = self
            .prompter
            .confirm("Allow processes to share a GPU?", gpu.sharing_mode == SharingMode::Shared)?;
        gpu.sharing_mode = if shared { SharingMode::Shared } else { SharingMode::ExclusiveProcess };
        gpu.multi_process_service = self
            .prompter
            .confirm("Enable multi-process service (MPS)?", gpu.multi_process_service)?;
        gpu.nvlink = self.prompter.confirm("Require NVLink?", gpu.nvlink)?;
        gpu.minimum_memory =
            self.ask_optional("Minimum GPU memory (e.g. 40G)", gpu.minimum_memory.as_deref())?;
        gpu.exclusive_job = self
            .prompter
            .confirm("Reserve the GPUs for this job only?", gpu.exclusive_job)?;

        Ok(gpu)
    }

    fn edit_queue(&mut self) -> Result<()> {
        let catalog = self.catalog;
        let mut queues = catalog.queues_for(self.spec.job_kind);
        if queues.is_empty() {
            self.prompter.notify(
                Notice::Warning,
                &format!("No queues for {} jobs; showing all", self.spec.job_kind.name()),
            );
            queues = catalog.queues.iter().collect();
        }
        if queues.is_empty() {
            self.prompter.notify(Notice::Error, "The catalog lists no queues");
            return Ok(());
        }

        let hours = self
            .spec
            .runtime_limit_str()
            .and_then(|s| s.parse::<Runtime>().ok())
            .map(|r| r.as_hours())
            .unwrap_or(1.0);
        let suggested = catalog.suggest_queues(self.spec.job_kind, hours);

        let items: Vec<String> = queues
            .iter()
            .map(|q| {
                let mark = if suggested.contains(&q.name.as_str()) { "  (recommended)" } else { "" };
                format!("{:<14} {} [max {}]{}", q.name, q.description, q.max_runtime_display(), mark)
            })
            .collect();
        let current = self
            .spec
            .queue_name()
            .and_then(|name| queues.iter().position(|q| q.name == name))
            .or_else(|| {
                suggested
                    .first()
                    .and_then(|name| queues.iter().position(|q| q.name == *name))
            })
            .unwrap_or(0);

        let choice = self.prompter.select("Queue:", &items, current)?;
        let queue = queues[choice];
        self.spec.queue = Some(queue.name.clone());

        if let Some(gpu) = self.spec.gpu_request() {
            if queue.has_accelerators() && !queue.accelerator_types.contains(&gpu.accelerator_id) {
                self.prompter.notify(
                    Notice::Warning,
                    &format!(
                        "{} offers {}; go back to Resources to change the GPU model",
                        queue.name,
                        queue.accelerator_types.join(", ")
                    ),
                );
            }
        }
        Ok(())
    }

    fn edit_runtime(&mut self) -> Result<()> {
        self.spec.name = self.prompter.input("Job name", &self.spec.name)?;
        self.spec.command = self.prompter.input("Command", &self.spec.command)?;

        let queue_default = self
            .spec
            .queue_name()
            .and_then(|name| self.catalog.queue(name))
            .and_then(|q| q.default_runtime)
            .map(|r| r.to_string());
        let current_limit = self.spec.runtime_limit.clone().or(queue_default);
        self.spec.runtime_limit =
            self.ask_optional("Runtime limit (MM or HH:MM)", current_limit.as_deref())?;

        let current_estimate = self.spec.runtime_estimate.clone();
        self.spec.runtime_estimate =
            self.ask_optional("Runtime estimate (MM or HH:MM)", current_estimate.as_deref())?;

        let enabled = self
            .prompter
            .confirm("Submit as a job array?", self.spec.batch_config.enabled)?;
        self.spec.batch_config.enabled = enabled;
        if enabled {
            let batch = self.spec.batch_config.clone();
            let start = self.ask_number("First index", batch.start_index)?;
            let end = self.ask_number("Last index", batch.end_index)?;
            let step = self.ask_number("Step", batch.step)?;
            let max = self.ask_number("Max tasks running at once (0 = no limit)", batch.max_parallel.unwrap_or(0))?;

            let batch = &mut self.spec.batch_config;
            batch.start_index = start;
            batch.end_index = end;
            batch.step = step;
            batch.max_parallel = (max > 0).then_some(max);
            let tasks = batch.task_count();
            self.prompter.print(&format!("{} tasks", tasks));
        }
        Ok(())
    }

    fn edit_files(&mut self) -> Result<()> {
        if self.spec.batch_config.enabled {
            self.prompter
                .notify(Notice::Info, "Use $LSB_JOBINDEX in file names to keep array task output apart");
        }

        let output = self.spec.output_path.clone();
        self.spec.output_path = self.ask_optional("Output file (-o)", output.as_deref())?;
        let error = self.spec.error_path.clone();
        self.spec.error_path = self.ask_optional("Error file (-e)", error.as_deref())?;
        let cwd = self.spec.working_directory.clone();
        self.spec.working_directory = self.ask_optional("Working directory", cwd.as_deref())?;

        self.spec.notify_on_start = self
            .prompter
            .confirm("Email when the job starts?", self.spec.notify_on_start)?;
        self.spec.notify_on_complete = self
            .prompter
            .confirm("Email when the job completes?", self.spec.notify_on_complete)?;
        if self.spec.is_interactive() {
            self.spec.x11_forwarding = self
                .prompter
                .confirm("Forward X11 for GUI applications?", self.spec.x11_forwarding)?;
        }
        Ok(())
    }

    fn edit_advanced(&mut self) -> Result<()> {
        if self.spec.job_kind == JobKind::Mpi {
            let current = self
                .spec
                .parallel_environment
                .clone()
                .unwrap_or_else(|| PARALLEL_48.to_string());
            self.spec.parallel_environment =
                self.ask_optional("Parallel environment (-app)", Some(current.as_str()))?;
        }

        if !self.prompter.confirm("Edit advanced options?", false)? {
            return Ok(());
        }

        let catalog = self.catalog;
        self.prompter.print(&format!(
            "Architectures: {}",
            catalog.architecture_options.join(", ")
        ));
        let tags = self
            .prompter
            .input("Architecture requirements (comma separated)", &self.spec.architecture_tags.join(","))?;
        self.spec.architecture_tags = if tags == CLEAR { Vec::new() } else { split_list(&tags, ',') };

        self.prompter
            .print(&format!("Licenses: {}", catalog.license_types.join(", ")));
        let current: Vec<String> = self
            .spec
            .license_requirements
            .iter()
            .map(|(name, count)| format!("{}={}", name, count))
            .collect();
        let answer = self.prompter.input("Licenses (name=count, ...)", &current.join(","))?;
        if answer == CLEAR {
            self.spec.license_requirements.clear();
        } else {
            match self.parse_licenses(&answer) {
                Some(licenses) => self.spec.license_requirements = licenses,
                None => self.prompter.notify(Notice::Warning, "Licenses left unchanged"),
            }
        }

        let answer = self.prompter.input(
            "Custom resource requirements (-R, separated by ';')",
            &self.spec.custom_resource_expressions.join(";"),
        )?;
        self.spec.custom_resource_expressions =
            if answer == CLEAR { Vec::new() } else { split_list(&answer, ';') };

        let current: Vec<String> = self
            .spec
            .environment_overrides
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        let answer = self
            .prompter
            .input("Environment variables (NAME=value, ...)", &current.join(","))?;
        if answer == CLEAR {
            self.spec.environment_overrides.clear();
        } else {
            match parse_pairs(&answer) {
                Ok(pairs) => self.spec.environment_overrides = pairs.into_iter().collect(),
                Err(entry) => self.prompter.notify(
                    Notice::Warning,
                    &format!("Expected NAME=value, got '{}'; environment left unchanged", entry),
                ),
            }
        }
        Ok(())
    }

    fn parse_licenses(&mut self, answer: &str) -> Option<BTreeMap<String, u32>> {
        let pairs = match parse_pairs(answer) {
            Ok(pairs) => pairs,
            Err(entry) => {
                self.prompter
                    .notify(Notice::Warning, &format!("Expected name=count, got '{}'", entry));
                return None;
            }
        };

        let mut licenses = BTreeMap::new();
        for (name, count) in pairs {
            match count.parse::<u32>() {
                Ok(count) => {
                    licenses.insert(name, count);
                }
                Err(_) => {
                    self.prompter
                        .notify(Notice::Warning, &format!("Invalid count for {}: {}", name, count));
                    return None;
                }
            }
        }
        Some(licenses)
    }

    fn review(&mut self) -> Result<()> {
        let catalog = self.catalog;
        let spec = &self.spec;
        let mut lines = vec![
            format!("Job type:      {}", spec.job_kind.name()),
            format!("Name:          {}", spec.name),
            format!("Command:       {}", spec.command),
            format!("Slots:         {}", spec.slots),
            format!("Queue:         {}", spec.queue_name().unwrap_or("(none)")),
            format!("Runtime limit: {}", spec.runtime_limit_str().unwrap_or("(none)")),
        ];
        if let Some(gpu) = spec.gpu_request() {
            lines.push(format!("GPUs:          {} x {}", gpu.unit_count, gpu.accelerator_id));
        }
        if spec.batch_config.enabled {
            lines.push(format!(
                "Array:         {} ({} tasks)",
                spec.batch_config.range_suffix(),
                spec.batch_config.task_count()
            ));
        }

        let pricing = &catalog.pricing;
        let cost = CostEstimate::for_job(spec, pricing);
        lines.push(String::new());
        lines.push("Command:".to_string());
        lines.push(format!("  {}", build_command(spec)));
        lines.push(String::new());
        lines.push("Estimated cost:".to_string());
        lines.extend(cost.breakdown(spec, pricing).into_iter().map(|l| format!("  {}", l)));

        for line in &lines {
            self.prompter.print(line);
        }
        Ok(())
    }
}
