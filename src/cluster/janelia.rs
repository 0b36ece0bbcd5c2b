//! Janelia Research Campus compute cluster
//!
//! Built-in catalog for the LSF cluster at Janelia:
//! - CPU queues `local`, `short` and `interactive`
//! - One GPU queue per model plus the mixed `gpu_short`
//! - `mpi` for jobs in 48-slot increments

use super::catalog::{
    AcceleratorInfo, ClusterCatalog, NodeInfo, Pricing, QueueCategory, QueueInfo,
};
use crate::job::Runtime;
use std::collections::BTreeMap;

/// Create the Janelia catalog
pub fn janelia_catalog() -> ClusterCatalog {
    let accelerators = janelia_accelerators();
    let accelerator_rates: BTreeMap<String, f64> = accelerators
        .iter()
        .map(|a| (a.id.clone(), a.cost_per_unit_hour))
        .collect();

    ClusterCatalog {
        name: "Janelia Compute Cluster".to_string(),
        queues: janelia_queues(),
        accelerators,
        nodes: janelia_nodes(),
        pricing: Pricing {
            cpu_cost_per_slot_hour: 0.05,
            memory_gb_per_slot: 15,
            max_slots_per_node: 64,
            accelerator_rates,
            default_accelerator_rate: 0.20,
        },
        architecture_options: strings(&["avx2", "avx512", "amx"]),
        license_types: strings(&["idl", "matlab"]),
        storage_roots: strings(&["/groups", "/nrs", "/scratch"]),
    }
}

fn hours(h: u32) -> Option<Runtime> {
    Some(Runtime::HoursMinutes { hours: h, minutes: 0 })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn gpu_queue(name: &str, description: &str, max_slots_per_job: Option<u32>, models: &[&str]) -> QueueInfo {
    QueueInfo {
        name: name.to_string(),
        category: QueueCategory::Gpu,
        description: description.to_string(),
        max_runtime: None,
        default_runtime: None,
        max_slots_per_job,
        max_slots_per_user: None,
        max_jobs_per_user: None,
        cost_per_slot_hour: 0.05,
        accelerator_types: strings(models),
        special_requirement_tags: Vec::new(),
    }
}

fn janelia_queues() -> Vec<QueueInfo> {
    let mut gpu_short = gpu_queue(
        "gpu_short",
        "Mixed GPU types for short jobs (1 hour limit)",
        None,
        &["TeslaT4_16GB", "TeslaL4_24GB", "NVIDIAA100_SXM4_80GB"],
    );
    gpu_short.max_runtime = hours(1);
    gpu_short.default_runtime = hours(1);

    vec![
        QueueInfo {
            name: "interactive".to_string(),
            category: QueueCategory::Interactive,
            description: "Interactive sessions for GUI applications and testing".to_string(),
            max_runtime: hours(48),
            default_runtime: hours(8),
            max_slots_per_job: None,
            max_slots_per_user: Some(96),
            max_jobs_per_user: Some(4),
            cost_per_slot_hour: 0.05,
            accelerator_types: Vec::new(),
            special_requirement_tags: Vec::new(),
        },
        // 30 day ceiling enforced by the scheduler, not by -W
        QueueInfo {
            name: "local".to_string(),
            category: QueueCategory::Cpu,
            description: "Default CPU queue for long-running jobs".to_string(),
            max_runtime: None,
            default_runtime: None,
            max_slots_per_job: None,
            max_slots_per_user: Some(3001),
            max_jobs_per_user: None,
            cost_per_slot_hour: 0.05,
            accelerator_types: Vec::new(),
            special_requirement_tags: Vec::new(),
        },
        QueueInfo {
            name: "short".to_string(),
            category: QueueCategory::Cpu,
            description: "Quick jobs under 1 hour".to_string(),
            max_runtime: hours(1),
            default_runtime: hours(1),
            max_slots_per_job: None,
            max_slots_per_user: None,
            max_jobs_per_user: None,
            cost_per_slot_hour: 0.05,
            accelerator_types: Vec::new(),
            special_requirement_tags: Vec::new(),
        },
        gpu_queue(
            "gpu_gh200",
            "GH200 Super Chip - Latest generation GPU/CPU combo",
            Some(72),
            &["NVIDIAGH200_96GB"],
        ),
        gpu_queue("gpu_h200", "H200 - High memory AI/ML workloads", Some(12), &["NVIDIAH200_141GB"]),
        gpu_queue("gpu_h100", "H100 - High performance AI/ML training", Some(12), &["NVIDIAH100_80GB"]),
        gpu_queue(
            "gpu_a100",
            "A100 - Versatile GPU for training and inference",
            Some(12),
            &["NVIDIAA100_SXM4_80GB"],
        ),
        gpu_queue("gpu_l4", "L4 - Cost-effective inference and light training", Some(8), &["TeslaL4_24GB"]),
        gpu_queue(
            "gpu_l4_large",
            "L4 Large - Single GPU per node for memory-intensive tasks",
            Some(64),
            &["TeslaL4_24GB"],
        ),
        gpu_queue("gpu_t4", "T4 - Entry-level GPU for development and testing", Some(48), &["TeslaT4_16GB"]),
        gpu_short,
        QueueInfo {
            name: "mpi".to_string(),
            category: QueueCategory::Special,
            description: "Parallel/MPI jobs (48-slot increments)".to_string(),
            max_runtime: None,
            default_runtime: None,
            max_slots_per_job: None,
            max_slots_per_user: None,
            max_jobs_per_user: None,
            cost_per_slot_hour: 0.05,
            accelerator_types: Vec::new(),
            special_requirement_tags: strings(&["parallel-48"]),
        },
    ]
}

fn janelia_accelerators() -> Vec<AcceleratorInfo> {
    vec![
        AcceleratorInfo {
            id: "NVIDIAGH200_96GB".to_string(),
            model: "GH200 Super Chip".to_string(),
            vram_gb: 96,
            node_count: 1,
            total_units: 1,
            tflops: 67.0,
            slots_per_unit: 72,
            cost_per_unit_hour: 0.80,
            features: strings(&["grace_cpu", "nvlink", "tensor_cores"]),
            queue_names: strings(&["gpu_gh200"]),
        },
        AcceleratorInfo {
            id: "NVIDIAH200_141GB".to_string(),
            model: "H200 SXM5".to_string(),
            vram_gb: 141,
            node_count: 8,
            total_units: 64,
            tflops: 67.0,
            slots_per_unit: 12,
            cost_per_unit_hour: 0.80,
            features: strings(&["nvlink", "tensor_cores", "transformer_engine"]),
            queue_names: strings(&["gpu_h200"]),
        },
        AcceleratorInfo {
            id: "NVIDIAH100_80GB".to_string(),
            model: "H100 SXM5".to_string(),
            vram_gb: 80,
            node_count: 10,
            total_units: 80,
            tflops: 67.0,
            slots_per_unit: 12,
            cost_per_unit_hour: 0.50,
            features: strings(&["nvlink", "tensor_cores", "transformer_engine"]),
            queue_names: strings(&["gpu_h100"]),
        },
        AcceleratorInfo {
            id: "NVIDIAA100_SXM4_80GB".to_string(),
            model: "A100 SXM4".to_string(),
            vram_gb: 80,
            node_count: 19,
            total_units: 76,
            tflops: 19.0,
            slots_per_unit: 12,
            cost_per_unit_hour: 0.20,
            features: strings(&["nvlink", "tensor_cores"]),
            queue_names: strings(&["gpu_a100", "gpu_short"]),
        },
        // Dense 8-GPU hosts plus single-GPU hosts behind gpu_l4_large
        AcceleratorInfo {
            id: "TeslaL4_24GB".to_string(),
            model: "Tesla L4".to_string(),
            vram_gb: 24,
            node_count: 49,
            total_units: 175,
            tflops: 30.3,
            slots_per_unit: 8,
            cost_per_unit_hour: 0.10,
            features: strings(&["tensor_cores", "rt_cores"]),
            queue_names: strings(&["gpu_l4", "gpu_l4_large", "gpu_short"]),
        },
        AcceleratorInfo {
            id: "TeslaT4_16GB".to_string(),
            model: "Tesla T4".to_string(),
            vram_gb: 16,
            node_count: 62,
            total_units: 62,
            tflops: 8.1,
            slots_per_unit: 48,
            cost_per_unit_hour: 0.10,
            features: strings(&["tensor_cores"]),
            queue_names: strings(&["gpu_t4", "gpu_short"]),
        },
    ]
}

fn janelia_nodes() -> Vec<NodeInfo> {
    vec![
        NodeInfo {
            name: "sky_lake".to_string(),
            rack: "e10".to_string(),
            cpu_model: "2.7 GHz Intel Platinum 8168".to_string(),
            cores: 48,
            node_count: 32,
            memory_gb: 768,
            interconnect: "25Gbit Ethernet".to_string(),
            features: strings(&["avx2", "avx512"]),
        },
        NodeInfo {
            name: "cascade_lake".to_string(),
            rack: "h07".to_string(),
            cpu_model: "3.0GHz Intel Gold 6248R".to_string(),
            cores: 48,
            node_count: 32,
            memory_gb: 768,
            interconnect: "25Gbit Ethernet".to_string(),
            features: strings(&["avx2", "avx512"]),
        },
        NodeInfo {
            name: "sapphire_rapids".to_string(),
            rack: "H06".to_string(),
            cpu_model: "2.8GHz Intel Platinum 8462Y+".to_string(),
            cores: 64,
            node_count: 32,
            memory_gb: 1024,
            interconnect: "100Gbit Ethernet".to_string(),
            features: strings(&["avx2", "avx512", "amx"]),
        },
    ]
}
