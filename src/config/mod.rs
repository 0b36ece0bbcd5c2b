//! Configuration module for BSub Wizard
//!
//! Provides CLI arguments, subcommands and resolved runtime settings.

mod settings;

pub use settings::*;
