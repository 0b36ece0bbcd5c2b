//! BSub Wizard CLI - Interactive bsub command builder
//!
//! Runs the step-by-step wizard, or one of the non-interactive subcommands.

use anyhow::{Context, Result};
use bsub_wizard::cluster::ClusterCatalog;
use bsub_wizard::config::{default_log_level, CliArgs, Commands, OutputFormat, Settings, DEBUG_ENV};
use bsub_wizard::generate::{example_commands, generate, write_script, CostEstimate};
use bsub_wizard::job::{snapshot, JobKind, JobSpecification};
use bsub_wizard::validate::{validate_job, StepReport};
use bsub_wizard::wizard::{Outcome, TermPrompter, Wizard};
use bsub_wizard::WizardError;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    if args.debug {
        std::env::set_var(DEBUG_ENV, "1");
    }

    // Initialize logging; RUST_LOG wins over -v
    let default_level = default_log_level(args.verbose);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Handle result
    if let Err(e) = run(args) {
        if std::env::var_os(DEBUG_ENV).is_some() {
            eprintln!("Error: {:?}", e);
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let settings = Settings::from_cli(&args)?;
    let catalog = settings
        .load_catalog()
        .context("Failed to load cluster catalog")?;

    match &args.command {
        Some(command) => handle_command(command, &catalog),
        None => run_wizard(&catalog, &settings),
    }
}

fn handle_command(command: &Commands, catalog: &ClusterCatalog) -> Result<()> {
    match command {
        Commands::Generate { snapshot, script, format } => {
            cmd_generate(catalog, snapshot, script.as_deref(), *format)
        }
        Commands::Validate { snapshot, format } => cmd_validate(catalog, snapshot, *format),
        Commands::Queues { kind } => {
            cmd_queues(catalog, *kind);
            Ok(())
        }
        Commands::Accelerators { queue } => {
            cmd_accelerators(catalog, queue.as_deref());
            Ok(())
        }
        Commands::Examples { kind } => {
            cmd_examples(*kind);
            Ok(())
        }
    }
}

fn run_wizard(catalog: &ClusterCatalog, settings: &Settings) -> Result<()> {
    let spec = match &settings.initial_snapshot {
        Some(path) => load_snapshot(path)?,
        None => JobSpecification::default(),
    };

    let mut wizard = Wizard::new(catalog, TermPrompter::stdio())
        .with_spec(spec)
        .with_output_dir(settings.output_dir.clone());

    match wizard.run()? {
        Outcome::Completed(generated) => {
            println!();
            println!("Submit with:");
            println!("  {}", generated.command);
        }
        Outcome::Quit => println!("BSub Wizard closed. Goodbye!"),
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<JobSpecification> {
    snapshot::load_file(path).with_context(|| format!("Failed to load configuration {}", path.display()))
}

/// Fail with every blocking error once warnings are shown
fn require_valid(report: &StepReport) -> Result<()> {
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    if report.is_ok() {
        Ok(())
    } else {
        Err(WizardError::invalid_job(report.errors.clone()).into())
    }
}

#[derive(Serialize)]
struct GenerateOutput<'a> {
    command: &'a str,
    cost: &'a CostEstimate,
    script: &'a str,
    warnings: &'a [String],
    script_path: Option<PathBuf>,
}

fn cmd_generate(
    catalog: &ClusterCatalog,
    snapshot_path: &Path,
    script_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let spec = load_snapshot(snapshot_path)?;
    let report = validate_job(&spec, catalog);
    require_valid(&report)?;

    let generated = generate(&spec, &catalog.pricing);
    if let Some(path) = script_path {
        write_script(&generated.script, path)?;
    }

    match format {
        OutputFormat::Text => {
            println!("{}", generated.command);
            println!();
            for line in generated.cost.breakdown(&spec, &catalog.pricing) {
                println!("{}", line);
            }
            if let Some(path) = script_path {
                println!("\nScript written to {}", path.display());
            }
        }
        OutputFormat::Json => {
            let output = GenerateOutput {
                command: &generated.command,
                cost: &generated.cost,
                script: &generated.script,
                warnings: &report.warnings,
                script_path: script_path.map(Path::to_path_buf),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn cmd_validate(catalog: &ClusterCatalog, snapshot_path: &Path, format: OutputFormat) -> Result<()> {
    let spec = load_snapshot(snapshot_path)?;
    let report = validate_job(&spec, catalog);

    match format {
        OutputFormat::Text => {
            for error in &report.errors {
                println!("error: {}", error);
            }
            for warning in &report.warnings {
                println!("warning: {}", warning);
            }
            if report.is_ok() {
                println!("{}: OK", snapshot_path.display());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err(WizardError::invalid_job(report.errors).into())
    }
}

fn cmd_queues(catalog: &ClusterCatalog, kind: Option<JobKind>) {
    let queues = match kind {
        Some(kind) => catalog.queues_for(kind),
        None => catalog.queues.iter().collect(),
    };

    println!("=== Queues: {} ===", catalog.name);
    println!("{:<14} {:<12} {:<10} {:>10}  Description", "Name", "Category", "Max time", "Slots/job");
    for queue in queues {
        let slots = queue
            .max_slots_per_job
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<14} {:<12} {:<10} {:>10}  {}",
            queue.name,
            format!("{:?}", queue.category).to_lowercase(),
            queue.max_runtime_display(),
            slots,
            queue.description
        );
    }
}

fn cmd_accelerators(catalog: &ClusterCatalog, queue: Option<&str>) {
    let accelerators = match queue {
        Some(queue) => catalog.accelerators_for(queue),
        None => catalog.accelerators.iter().collect(),
    };

    if accelerators.is_empty() {
        println!("No GPU models found");
        return;
    }

    println!("{:<24} {:<18} {:>5} {:>6} {:>8}  Queues", "ID", "Model", "VRAM", "GPUs", "$/hour");
    for accel in accelerators {
        println!(
            "{:<24} {:<18} {:>4}G {:>6} {:>8.2}  {}",
            accel.id,
            accel.model,
            accel.vram_gb,
            accel.total_units,
            catalog.pricing.accelerator_rate(&accel.id),
            accel.queue_names.join(", ")
        );
    }
}

fn cmd_examples(kind: Option<JobKind>) {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => JobKind::ALL.to_vec(),
    };

    for kind in kinds {
        println!("=== {} jobs ===", kind.name());
        for example in example_commands(kind) {
            println!("  {}", example);
        }
        println!();
    }
}
