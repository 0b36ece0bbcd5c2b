//! Cluster catalog module
//!
//! Static reference data about the target cluster: queues, GPU models,
//! node classes and charge rates.

mod catalog;
pub mod janelia;

pub use catalog::*;
pub use janelia::janelia_catalog;
