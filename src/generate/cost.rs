//! Job cost estimation

use crate::cluster::Pricing;
use crate::job::{JobSpecification, Runtime};
use serde::Serialize;

/// Estimated charge for a job with its breakdown
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CostEstimate {
    /// Runtime limit in hours, `None` when there was no limit to price
    pub hours: Option<f64>,
    /// Slot charge for a single task
    pub cpu_cost: f64,
    /// Accelerator charge for a single task
    pub accelerator_cost: f64,
    /// Array cost multiplier, 1 for plain jobs
    pub multiplier: i64,
    /// Array tasks shown to the user
    pub task_count: i64,
    /// Grand total
    pub total: f64,
}

impl CostEstimate {
    /// Estimate the cost of a job.
    ///
    /// Without a parseable runtime limit there is nothing to charge and
    /// every amount is zero.
    pub fn for_job(spec: &JobSpecification, pricing: &Pricing) -> Self {
        let batch = &spec.batch_config;
        let (multiplier, task_count) = if batch.enabled {
            (batch.cost_multiplier(), batch.task_count())
        } else {
            (1, 1)
        };

        let hours = match spec.runtime_limit_str().map(str::parse::<Runtime>) {
            Some(Ok(runtime)) => runtime.as_hours(),
            _ => {
                return Self {
                    multiplier,
                    task_count,
                    ..Default::default()
                }
            }
        };

        let cpu_cost = spec.slots as f64 * hours * pricing.cpu_cost_per_slot_hour;
        let accelerator_cost = match spec.gpu_request() {
            Some(gpu) => {
                let id = if gpu.accelerator_id.is_empty() {
                    "default"
                } else {
                    gpu.accelerator_id.as_str()
                };
                gpu.unit_count as f64 * hours * pricing.accelerator_rate(id)
            }
            None => 0.0,
        };

        Self {
            hours: Some(hours),
            cpu_cost,
            accelerator_cost,
            multiplier,
            task_count,
            total: (cpu_cost + accelerator_cost) * multiplier as f64,
        }
    }

    /// True if there was a runtime limit to price
    pub fn is_priced(&self) -> bool {
        self.hours.is_some()
    }

    /// Breakdown lines for the review screen
    pub fn breakdown(&self, spec: &JobSpecification, pricing: &Pricing) -> Vec<String> {
        let Some(hours) = self.hours else {
            return vec!["Cannot estimate cost without runtime limit".to_string()];
        };

        let mut lines = vec![format!(
            "CPU: {} slots x {:.1} hours x ${:.2} = ${:.2}",
            spec.slots, hours, pricing.cpu_cost_per_slot_hour, self.cpu_cost
        )];

        if let Some(gpu) = spec.gpu_request() {
            lines.push(format!(
                "GPU: {} x {:.1} hours x ${:.2} = ${:.2}",
                gpu.unit_count,
                hours,
                pricing.accelerator_rate(&gpu.accelerator_id),
                self.accelerator_cost
            ));
        }

        if spec.batch_config.enabled {
            lines.push(format!(
                "Array: {} tasks (cost multiplier x{})",
                self.task_count, self.multiplier
            ));
        }

        lines.push(format!("Total: ${:.2}", self.total));
        lines
    }
}

/// Shorthand for [`CostEstimate::for_job`] returning only the total
pub fn estimate_cost(spec: &JobSpecification, pricing: &Pricing) -> f64 {
    CostEstimate::for_job(spec, pricing).total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterCatalog;
    use crate::job::{AcceleratorConfig, BatchConfig, JobKind};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_no_runtime_limit_costs_nothing() {
        let catalog = ClusterCatalog::default();
        let mut spec = JobSpecification::default();
        spec.slots = 16;
        let cost = CostEstimate::for_job(&spec, &catalog.pricing);
        assert_eq!(cost.total, 0.0);
        assert!(!cost.is_priced());

        spec.runtime_limit = Some("soon".to_string());
        assert_eq!(estimate_cost(&spec, &catalog.pricing), 0.0);
    }

    #[test]
    fn test_no_runtime_limit_costs_nothing_for_gpu_jobs() {
        let catalog = ClusterCatalog::default();
        let mut spec = JobSpecification::new(JobKind::Gpu);
        spec.slots = 48;
        spec.accelerator_config = Some(AcceleratorConfig {
            accelerator_id: "NVIDIAH100_80GB".to_string(),
            unit_count: 8,
            ..Default::default()
        });
        spec.batch_config = BatchConfig::range(1, 500);

        let cost = CostEstimate::for_job(&spec, &catalog.pricing);
        assert_eq!(cost.accelerator_cost, 0.0);
        assert_eq!(cost.cpu_cost, 0.0);
        assert_eq!(cost.total, 0.0);
        assert_eq!(cost.multiplier, 500);
        assert!(!cost.is_priced());
    }

    #[test]
    fn test_zero_runtime_limit_is_still_priced() {
        let catalog = ClusterCatalog::default();
        let mut spec = JobSpecification::default();
        spec.slots = 4;
        spec.runtime_limit = Some("0".to_string());

        let cost = CostEstimate::for_job(&spec, &catalog.pricing);
        assert!(cost.is_priced());
        assert_eq!(cost.hours, Some(0.0));
        assert_eq!(cost.total, 0.0);
        let lines = cost.breakdown(&spec, &catalog.pricing);
        assert_eq!(lines.first().unwrap(), "CPU: 4 slots x 0.0 hours x $0.05 = $0.00");
        assert_eq!(lines.last().unwrap(), "Total: $0.00");
    }

    #[test]
    fn test_cpu_cost() {
        let catalog = ClusterCatalog::default();
        let mut spec = JobSpecification::default();
        spec.slots = 4;
        spec.runtime_limit = Some("1:00".to_string());
        assert!(approx(estimate_cost(&spec, &catalog.pricing), 0.20));

        // bare minutes
        spec.runtime_limit = Some("90".to_string());
        assert!(approx(estimate_cost(&spec, &catalog.pricing), 0.30));
    }

    #[test]
    fn test_gpu_cost() {
        let catalog = ClusterCatalog::default();
        let mut spec = JobSpecification::new(JobKind::Gpu);
        spec.slots = 12;
        spec.runtime_limit = Some("2:00".to_string());
        spec.accelerator_config = Some(AcceleratorConfig {
            accelerator_id: "NVIDIAA100_SXM4_80GB".to_string(),
            ..Default::default()
        });

        let cost = CostEstimate::for_job(&spec, &catalog.pricing);
        assert!(approx(cost.cpu_cost, 1.20));
        assert!(approx(cost.accelerator_cost, 0.40));
        assert!(approx(cost.total, 1.60));
        assert_eq!(format!("{:.2}", cost.total), "1.60");
    }

    #[test]
    fn test_unknown_accelerator_uses_default_rate() {
        let catalog = ClusterCatalog::default();
        let mut spec = JobSpecification::new(JobKind::Gpu);
        spec.slots = 1;
        spec.runtime_limit = Some("1:00".to_string());
        let cost = CostEstimate::for_job(&spec, &catalog.pricing);
        assert!(approx(cost.accelerator_cost, 0.20));
    }

    #[test]
    fn test_array_cost() {
        let catalog = ClusterCatalog::default();
        let mut spec = JobSpecification::default();
        spec.slots = 4;
        spec.runtime_limit = Some("1:00".to_string());
        spec.batch_config = BatchConfig::range(1, 100);

        let cost = CostEstimate::for_job(&spec, &catalog.pricing);
        assert_eq!(cost.task_count, 100);
        assert_eq!(cost.multiplier, 100);
        assert!(approx(cost.total, 20.0));
        assert_eq!(format!("{:.2}", cost.total), "20.00");
    }

    #[test]
    fn test_array_multiplier_uses_floor_of_inclusive_span() {
        let catalog = ClusterCatalog::default();
        let mut spec = JobSpecification::default();
        spec.slots = 1;
        spec.runtime_limit = Some("1:00".to_string());
        spec.batch_config = BatchConfig { step: 3, ..BatchConfig::range(1, 10) };

        let cost = CostEstimate::for_job(&spec, &catalog.pricing);
        assert_eq!(cost.task_count, 4);
        assert_eq!(cost.multiplier, 3);
        assert!(approx(cost.total, 0.15));
    }

    #[test]
    fn test_breakdown_lines() {
        let catalog = ClusterCatalog::default();
        let mut spec = JobSpecification::default();
        spec.slots = 4;
        assert_eq!(
            CostEstimate::for_job(&spec, &catalog.pricing).breakdown(&spec, &catalog.pricing),
            vec!["Cannot estimate cost without runtime limit"]
        );

        spec.runtime_limit = Some("1:00".to_string());
        let lines = CostEstimate::for_job(&spec, &catalog.pricing).breakdown(&spec, &catalog.pricing);
        assert_eq!(lines.first().unwrap(), "CPU: 4 slots x 1.0 hours x $0.05 = $0.20");
        assert_eq!(lines.last().unwrap(), "Total: $0.20");
    }
}
