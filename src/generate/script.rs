//! Submission script generation and export

use super::command::build_command;
use crate::error::{IoResultExt, Result};
use crate::job::JobSpecification;
use std::path::{Path, PathBuf};

/// Render a bash script that exports the job's environment and submits it
pub fn generate_script(spec: &JobSpecification) -> String {
    let mut script = String::from("#!/bin/bash\n\n");
    script.push_str("# Generated by BSub Wizard\n");
    script.push_str(&format!("# Job: {}\n", spec.name));
    script.push_str(&format!("# Type: {}\n\n", spec.job_kind.as_str()));

    if !spec.environment_overrides.is_empty() {
        script.push_str("# Environment variables\n");
        for (name, value) in &spec.environment_overrides {
            script.push_str(&format!("export {}='{}'\n", name, value));
        }
        script.push('\n');
    }

    script.push_str("# Submit job\n");
    script.push_str(&build_command(spec));
    script.push('\n');

    script
}

/// `<name>_submit.sh`, or `job_submit.sh` for an unnamed job
pub fn default_script_filename(spec: &JobSpecification) -> PathBuf {
    let stem = if spec.name.is_empty() { "job" } else { spec.name.as_str() };
    PathBuf::from(format!("{}_submit.sh", stem))
}

/// Write a script to disk and mark it executable
pub fn write_script(script: &str, path: &Path) -> Result<()> {
    std::fs::write(path, script).with_path(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).with_path(path)?;
    }

    tracing::debug!("Wrote submission script to {}", path.display());
    Ok(())
}
