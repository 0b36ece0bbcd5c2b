//! Cluster catalog: queues, accelerators, node classes and pricing
//!
//! The catalog is reference data. It is built once (the built-in Janelia
//! catalog or a JSON file) and passed by reference to the validator, the
//! generator and the wizard. Every lookup is total: unknown names give
//! `None` or an empty list.

use crate::error::{IoResultExt, Result, WizardError};
use crate::job::{JobKind, Runtime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Scheduling class of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueCategory {
    /// Batch CPU queue
    Cpu,
    /// GPU queue
    Gpu,
    /// Interactive sessions
    Interactive,
    /// Special-purpose (MPI)
    Special,
}

impl QueueCategory {
    /// Categories offered for a job kind
    pub fn for_kind(kind: JobKind) -> &'static [QueueCategory] {
        match kind {
            JobKind::Cpu => &[QueueCategory::Cpu, QueueCategory::Interactive],
            JobKind::Gpu => &[QueueCategory::Gpu],
            JobKind::Interactive => &[QueueCategory::Interactive],
            JobKind::Mpi => &[QueueCategory::Special],
        }
    }
}

/// A scheduler queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueInfo {
    /// Queue name as used with `-q`
    pub name: String,
    /// Scheduling class
    pub category: QueueCategory,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Hard runtime ceiling
    #[serde(default)]
    pub max_runtime: Option<Runtime>,
    /// Runtime applied when the job sets none
    #[serde(default)]
    pub default_runtime: Option<Runtime>,
    #[serde(default)]
    pub max_slots_per_job: Option<u32>,
    #[serde(default)]
    pub max_slots_per_user: Option<u32>,
    #[serde(default)]
    pub max_jobs_per_user: Option<u32>,
    /// Charge per slot-hour
    pub cost_per_slot_hour: f64,
    /// Accelerator IDs available in this queue
    #[serde(default)]
    pub accelerator_types: Vec<String>,
    /// Extra tags such as `parallel-48`
    #[serde(default)]
    pub special_requirement_tags: Vec<String>,
}

impl QueueInfo {
    /// Human-readable runtime ceiling
    pub fn max_runtime_display(&self) -> String {
        match self.max_runtime {
            Some(runtime) => runtime.display_human(),
            None => "No limit".to_string(),
        }
    }

    /// True if the queue offers accelerators
    pub fn has_accelerators(&self) -> bool {
        !self.accelerator_types.is_empty()
    }
}

/// A GPU model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceleratorInfo {
    /// ID used with `gmodel=`
    pub id: String,
    /// Marketing model name
    pub model: String,
    pub vram_gb: u32,
    /// Hosts carrying this model
    pub node_count: u32,
    /// GPUs across all hosts
    pub total_units: u32,
    /// Peak FP64 TFLOPS
    pub tflops: f64,
    /// CPU slots that come with each GPU
    pub slots_per_unit: u32,
    pub cost_per_unit_hour: f64,
    #[serde(default)]
    pub features: Vec<String>,
    /// Queues offering this model
    #[serde(default)]
    pub queue_names: Vec<String>,
}

impl AcceleratorInfo {
    /// "A100 SXM4 (80GB VRAM)"
    pub fn display_name(&self) -> String {
        format!("{} ({}GB VRAM)", self.model, self.vram_gb)
    }
}

/// A class of compute hosts. Informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Class name, e.g. `sapphire_rapids`
    pub name: String,
    pub rack: String,
    pub cpu_model: String,
    pub cores: u32,
    pub node_count: u32,
    pub memory_gb: u32,
    pub interconnect: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Global charge rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pricing {
    pub cpu_cost_per_slot_hour: f64,
    /// Memory that comes with one slot
    pub memory_gb_per_slot: u32,
    /// Slot ceiling for a single job
    pub max_slots_per_node: u32,
    /// Hourly rate per accelerator ID
    #[serde(default)]
    pub accelerator_rates: BTreeMap<String, f64>,
    /// Rate for accelerators missing from the table
    pub default_accelerator_rate: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            cpu_cost_per_slot_hour: 0.05,
            memory_gb_per_slot: 15,
            max_slots_per_node: 64,
            accelerator_rates: BTreeMap::new(),
            default_accelerator_rate: 0.20,
        }
    }
}

impl Pricing {
    /// Hourly rate for an accelerator, falling back to the default rate
    pub fn accelerator_rate(&self, accelerator_id: &str) -> f64 {
        self.accelerator_rates
            .get(accelerator_id)
            .copied()
            .unwrap_or(self.default_accelerator_rate)
    }
}

/// Static description of a cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterCatalog {
    /// Display name
    pub name: String,
    pub queues: Vec<QueueInfo>,
    pub accelerators: Vec<AcceleratorInfo>,
    #[serde(default)]
    pub nodes: Vec<NodeInfo>,
    pub pricing: Pricing,
    /// Known CPU feature tags for `select[]`
    #[serde(default)]
    pub architecture_options: Vec<String>,
    /// Known license names for `rusage[]`
    #[serde(default)]
    pub license_types: Vec<String>,
    /// Filesystem roots jobs are expected to write under
    #[serde(default)]
    pub storage_roots: Vec<String>,
}

impl Default for ClusterCatalog {
    fn default() -> Self {
        super::janelia::janelia_catalog()
    }
}

impl ClusterCatalog {
    /// Load a catalog from a JSON file and check its cross references
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let catalog: ClusterCatalog = serde_json::from_str(&content)
            .map_err(|e| WizardError::Catalog(format!("{}: {}", path.display(), e)))?;

        let issues = catalog.integrity_issues();
        if !issues.is_empty() {
            return Err(WizardError::Catalog(issues.join("; ")));
        }

        tracing::info!(
            "Loaded catalog '{}' ({} queues, {} accelerators) from {}",
            catalog.name,
            catalog.queues.len(),
            catalog.accelerators.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Look up a queue by name
    pub fn queue(&self, name: &str) -> Option<&QueueInfo> {
        self.queues.iter().find(|q| q.name == name)
    }

    /// Look up an accelerator by ID
    pub fn accelerator(&self, id: &str) -> Option<&AcceleratorInfo> {
        self.accelerators.iter().find(|a| a.id == id)
    }

    /// Look up a node class by name
    pub fn node(&self, name: &str) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Queues relevant to a job kind, in catalog order
    pub fn queues_for(&self, kind: JobKind) -> Vec<&QueueInfo> {
        let categories = QueueCategory::for_kind(kind);
        self.queues
            .iter()
            .filter(|q| categories.contains(&q.category))
            .collect()
    }

    /// Like [`queues_for`](Self::queues_for) but keyed by the kind's name.
    /// An unrecognized name returns every queue.
    pub fn queues_for_kind_name(&self, kind: &str) -> Vec<&QueueInfo> {
        match JobKind::from_name(kind) {
            Some(kind) => self.queues_for(kind),
            None => self.queues.iter().collect(),
        }
    }

    /// Accelerators offered by a queue
    pub fn accelerators_for(&self, queue_name: &str) -> Vec<&AcceleratorInfo> {
        match self.queue(queue_name) {
            Some(queue) if queue.has_accelerators() => self
                .accelerators
                .iter()
                .filter(|a| a.queue_names.iter().any(|q| q == queue_name))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Queue names worth suggesting for a job
    pub fn suggest_queues(&self, kind: JobKind, runtime_hours: f64) -> Vec<&str> {
        let short = runtime_hours <= 1.0;
        let wanted: &[&str] = match kind {
            JobKind::Interactive => &["interactive"],
            JobKind::Gpu if short => &["gpu_short"],
            JobKind::Gpu => &["gpu_a100", "gpu_l4", "gpu_t4"],
            JobKind::Cpu | JobKind::Mpi if short => &["short"],
            JobKind::Cpu | JobKind::Mpi => &["local"],
        };

        wanted
            .iter()
            .filter_map(|name| self.queue(name).map(|q| q.name.as_str()))
            .collect()
    }

    /// Broken cross references between queues and accelerators
    pub fn integrity_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for queue in &self.queues {
            for id in &queue.accelerator_types {
                if self.accelerator(id).is_none() {
                    issues.push(format!("queue '{}' references unknown accelerator '{}'", queue.name, id));
                }
            }
        }

        for accel in &self.accelerators {
            for name in &accel.queue_names {
                if self.queue(name).is_none() {
                    issues.push(format!("accelerator '{}' references unknown queue '{}'", accel.id, name));
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names<'a>(queues: &[&'a QueueInfo]) -> Vec<&'a str> {
        queues.iter().map(|q| q.name.as_str()).collect()
    }

    #[test]
    fn test_builtin_catalog_is_consistent() {
        let catalog = ClusterCatalog::default();
        assert!(catalog.integrity_issues().is_empty());
        assert!(catalog.queue("local").is_some());
        assert!(catalog.accelerator("NVIDIAA100_SXM4_80GB").is_some());
        assert!(catalog.node("sapphire_rapids").is_some());
    }

    #[test]
    fn test_queues_for_kind() {
        let catalog = ClusterCatalog::default();

        let cpu = names(&catalog.queues_for(JobKind::Cpu));
        assert_eq!(cpu, vec!["interactive", "local", "short"]);

        let mpi = names(&catalog.queues_for(JobKind::Mpi));
        assert_eq!(mpi, vec!["mpi"]);

        let gpu = catalog.queues_for(JobKind::Gpu);
        assert!(gpu.iter().all(|q| q.category == QueueCategory::Gpu));
        assert_eq!(gpu.len(), 8);

        assert_eq!(catalog.queues_for_kind_name("bogus").len(), catalog.queues.len());
        assert_eq!(names(&catalog.queues_for_kind_name("interactive")), vec!["interactive"]);
    }

    #[test]
    fn test_accelerators_for_queue() {
        let catalog = ClusterCatalog::default();

        let short: Vec<&str> = catalog
            .accelerators_for("gpu_short")
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(short, vec!["NVIDIAA100_SXM4_80GB", "TeslaL4_24GB", "TeslaT4_16GB"]);

        assert!(catalog.accelerators_for("local").is_empty());
        assert!(catalog.accelerators_for("no_such_queue").is_empty());
    }

    #[test]
    fn test_pricing_rates() {
        let catalog = ClusterCatalog::default();
        assert_eq!(catalog.pricing.accelerator_rate("NVIDIAH100_80GB"), 0.50);
        assert_eq!(catalog.pricing.accelerator_rate("unknown"), 0.20);
    }

    #[test]
    fn test_suggest_queues() {
        let catalog = ClusterCatalog::default();
        assert_eq!(catalog.suggest_queues(JobKind::Cpu, 0.5), vec!["short"]);
        assert_eq!(catalog.suggest_queues(JobKind::Cpu, 8.0), vec!["local"]);
        assert_eq!(catalog.suggest_queues(JobKind::Gpu, 1.0), vec!["gpu_short"]);
        assert_eq!(catalog.suggest_queues(JobKind::Gpu, 4.0), vec!["gpu_a100", "gpu_l4", "gpu_t4"]);
        assert_eq!(catalog.suggest_queues(JobKind::Interactive, 12.0), vec!["interactive"]);
    }

    #[test]
    fn test_max_runtime_display() {
        let catalog = ClusterCatalog::default();
        assert_eq!(catalog.queue("interactive").unwrap().max_runtime_display(), "48 hours");
        assert_eq!(catalog.queue("local").unwrap().max_runtime_display(), "No limit");
    }

    #[test]
    fn test_catalog_file_round_trip_and_integrity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");

        let catalog = ClusterCatalog::default();
        std::fs::write(&path, serde_json::to_string_pretty(&catalog).unwrap()).unwrap();
        let loaded = ClusterCatalog::from_json_file(&path).unwrap();
        assert_eq!(loaded.queues.len(), catalog.queues.len());

        let mut broken = catalog.clone();
        broken.queues[0].accelerator_types.push("GHOST".to_string());
        std::fs::write(&path, serde_json::to_string(&broken).unwrap()).unwrap();
        let err = ClusterCatalog::from_json_file(&path).unwrap_err();
        assert!(err.to_string().contains("GHOST"));
    }
}
