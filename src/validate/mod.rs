//! Job validation
//!
//! Field rules live in [`rules`]; [`steps`] groups them per wizard step
//! and adds the softer warnings shown alongside.

pub mod rules;
mod steps;

pub use rules::{RuleResult, RuleViolation};
pub use steps::*;
