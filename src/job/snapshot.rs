//! Configuration snapshots
//!
//! A snapshot is a pretty-printed JSON object holding every job field by
//! name. The accelerator block is written only when the job has one, the
//! batch block only when the array is enabled. Array settings of a job
//! that is not an array are not kept and load back as defaults.

use super::spec::{AcceleratorConfig, BatchConfig, JobKind, JobSpecification};
use crate::error::{IoResultExt, Result, WizardError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk form of a [`JobSpecification`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSnapshot {
    /// Snapshot format version
    pub version: u32,
    /// When the snapshot was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub job_kind: JobKind,
    pub name: String,
    pub command: String,
    pub slots: u32,
    pub queue: Option<String>,
    pub runtime_limit: Option<String>,
    pub runtime_estimate: Option<String>,
    pub output_path: Option<String>,
    pub error_path: Option<String>,
    pub working_directory: Option<String>,
    pub notify_on_complete: bool,
    pub notify_on_start: bool,
    pub x11_forwarding: bool,
    pub architecture_tags: Vec<String>,
    pub license_requirements: BTreeMap<String, u32>,
    pub custom_resource_expressions: Vec<String>,
    pub environment_overrides: BTreeMap<String, String>,
    pub parallel_environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accelerator: Option<AcceleratorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchConfig>,
}

impl Default for JobSnapshot {
    fn default() -> Self {
        Self::from(&JobSpecification::default())
    }
}

impl JobSnapshot {
    /// Current snapshot version
    pub const VERSION: u32 = 1;

    /// Stamp the snapshot with the current time
    pub fn stamped(mut self) -> Self {
        self.saved_at = Some(Utc::now());
        self
    }

    /// Convert back into a job specification
    pub fn into_spec(self) -> JobSpecification {
        JobSpecification {
            job_kind: self.job_kind,
            name: self.name,
            command: self.command,
            slots: self.slots,
            queue: self.queue,
            runtime_limit: self.runtime_limit,
            runtime_estimate: self.runtime_estimate,
            accelerator_config: self.accelerator,
            output_path: self.output_path,
            error_path: self.error_path,
            working_directory: self.working_directory,
            notify_on_complete: self.notify_on_complete,
            notify_on_start: self.notify_on_start,
            x11_forwarding: self.x11_forwarding,
            batch_config: self.batch.unwrap_or_default(),
            architecture_tags: self.architecture_tags,
            license_requirements: self.license_requirements,
            custom_resource_expressions: self.custom_resource_expressions,
            environment_overrides: self.environment_overrides,
            parallel_environment: self.parallel_environment,
        }
    }
}

impl From<&JobSpecification> for JobSnapshot {
    fn from(spec: &JobSpecification) -> Self {
        Self {
            version: Self::VERSION,
            saved_at: None,
            job_kind: spec.job_kind,
            name: spec.name.clone(),
            command: spec.command.clone(),
            slots: spec.slots,
            queue: spec.queue.clone(),
            runtime_limit: spec.runtime_limit.clone(),
            runtime_estimate: spec.runtime_estimate.clone(),
            output_path: spec.output_path.clone(),
            error_path: spec.error_path.clone(),
            working_directory: spec.working_directory.clone(),
            notify_on_complete: spec.notify_on_complete,
            notify_on_start: spec.notify_on_start,
            x11_forwarding: spec.x11_forwarding,
            architecture_tags: spec.architecture_tags.clone(),
            license_requirements: spec.license_requirements.clone(),
            custom_resource_expressions: spec.custom_resource_expressions.clone(),
            environment_overrides: spec.environment_overrides.clone(),
            parallel_environment: spec.parallel_environment.clone(),
            accelerator: spec.accelerator_config.clone(),
            batch: spec
                .batch_config
                .enabled
                .then(|| spec.batch_config.clone()),
        }
    }
}

/// Serialize a specification to snapshot JSON
pub fn store(spec: &JobSpecification) -> Result<String> {
    let snapshot = JobSnapshot::from(spec).stamped();
    serde_json::to_string_pretty(&snapshot).map_err(|e| WizardError::Snapshot(e.to_string()))
}

/// Parse snapshot JSON back into a specification
pub fn load(json: &str) -> Result<JobSpecification> {
    let snapshot: JobSnapshot =
        serde_json::from_str(json).map_err(|e| WizardError::Snapshot(e.to_string()))?;
    if snapshot.version > JobSnapshot::VERSION {
        return Err(WizardError::Snapshot(format!(
            "unsupported snapshot version {} (newest known is {})",
            snapshot.version,
            JobSnapshot::VERSION
        )));
    }
    Ok(snapshot.into_spec())
}

/// Write a snapshot file
pub fn save_file(spec: &JobSpecification, path: &Path) -> Result<()> {
    let json = store(spec)?;
    std::fs::write(path, json).with_path(path)?;
    tracing::debug!("Saved job snapshot to {}", path.display());
    Ok(())
}

/// Read a snapshot file
pub fn load_file(path: &Path) -> Result<JobSpecification> {
    let content = std::fs::read_to_string(path).with_path(path)?;
    let spec = load(&content).map_err(|e| e.with_context(format!("Loading {}", path.display())))?;
    tracing::debug!("Loaded job snapshot from {}", path.display());
    Ok(spec)
}

/// Default snapshot filename: `<name>.json`, or `job_config.json`
pub fn default_filename(spec: &JobSpecification) -> PathBuf {
    let stem = if spec.name.is_empty() { "job_config" } else { spec.name.as_str() };
    PathBuf::from(format!("{}.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::spec::SharingMode;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn full_gpu_spec() -> JobSpecification {
        let mut spec = JobSpecification::new(JobKind::Gpu);
        spec.name = "train".to_string();
        spec.command = "python train.py".to_string();
        spec.slots = 12;
        spec.queue = Some("gpu_h100".to_string());
        spec.runtime_limit = Some("4:00".to_string());
        spec.runtime_estimate = Some("180".to_string());
        spec.accelerator_config = Some(AcceleratorConfig {
            accelerator_id: "NVIDIAH100_80GB".to_string(),
            unit_count: 2,
            sharing_mode: SharingMode::Shared,
            multi_process_service: true,
            nvlink: true,
            minimum_memory: Some("40G".to_string()),
            exclusive_job: false,
        });
        spec.output_path = Some("/groups/lab/out_$LSB_JOBINDEX.log".to_string());
        spec.notify_on_start = true;
        spec.batch_config = BatchConfig {
            enabled: true,
            start_index: 1,
            end_index: 20,
            step: 2,
            max_parallel: Some(4),
        };
        spec.architecture_tags = vec!["avx512".to_string()];
        spec.license_requirements.insert("matlab".to_string(), 2);
        spec.custom_resource_expressions.push("select[mem>64000]".to_string());
        spec.environment_overrides.insert("OMP_NUM_THREADS".to_string(), "12".to_string());
        spec
    }

    #[test]
    fn test_round_trip_full_spec() {
        let spec = full_gpu_spec();
        let json = store(&spec).unwrap();
        assert_eq!(load(&json).unwrap(), spec);
    }

    #[test]
    fn test_optional_blocks_omitted() {
        let spec = JobSpecification::default();
        let json = store(&spec).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("accelerator").is_none());
        assert!(value.get("batch").is_none());
        assert_eq!(value["job_kind"], "cpu");
        assert!(value.get("saved_at").is_some());
    }

    #[test]
    fn test_disabled_array_settings_are_not_kept() {
        let mut spec = JobSpecification::default();
        spec.batch_config = BatchConfig {
            enabled: false,
            start_index: 5,
            end_index: 50,
            step: 5,
            max_parallel: Some(2),
        };
        let json = store(&spec).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("batch").is_none());
        assert_eq!(load(&json).unwrap().batch_config, BatchConfig::default());
    }

    #[test]
    fn test_load_tolerates_missing_fields() {
        let spec = load(r#"{"job_kind": "interactive", "name": "dev", "command": "/bin/bash"}"#).unwrap();
        assert_eq!(spec.job_kind, JobKind::Interactive);
        assert_eq!(spec.slots, 1);
        assert!(!spec.batch_config.enabled);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(load("{not json"), Err(WizardError::Snapshot(_))));
        assert!(matches!(load(r#"{"version": 99}"#), Err(WizardError::Snapshot(_))));
        assert!(load(r#"{"slots": -4}"#).is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let spec = full_gpu_spec();
        let path = dir.path().join(default_filename(&spec));
        assert!(path.ends_with("train.json"));

        save_file(&spec, &path).unwrap();
        assert_eq!(load_file(&path).unwrap(), spec);

        let missing = dir.path().join("missing.json");
        let err = load_file(&missing).unwrap_err();
        assert_eq!(err.path(), Some(&missing));
    }

    #[test]
    fn test_default_filename_without_name() {
        assert_eq!(default_filename(&JobSpecification::default()), PathBuf::from("job_config.json"));
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            name in "[A-Za-z0-9_-]{0,20}",
            command in ".{0,40}",
            slots in 1u32..=64,
            queue in proptest::option::of("[a-z_0-9]{1,12}"),
            limit in proptest::option::of("[0-9]{1,3}:[0-5][0-9]"),
            start in 1u32..100,
            span in 0u32..100,
            step in 1u32..5,
            enabled in any::<bool>(),
            env in proptest::collection::btree_map("[A-Z_]{1,8}", ".{0,10}", 0..4),
        ) {
            let mut spec = JobSpecification::default();
            spec.name = name;
            spec.command = command;
            spec.slots = slots;
            spec.queue = queue;
            spec.runtime_limit = limit;
            spec.environment_overrides = env;
            spec.batch_config = BatchConfig {
                enabled,
                start_index: start,
                end_index: start + span,
                step,
                max_parallel: (step > 2).then_some(step),
            };

            let mut expected = spec.clone();
            if !enabled {
                expected.batch_config = BatchConfig::default();
            }
            let json = store(&spec).unwrap();
            prop_assert_eq!(load(&json).unwrap(), expected);
        }
    }
}
