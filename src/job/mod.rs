//! Job specification module
//!
//! The mutable record describing one job request, the runtime duration
//! type it uses, and JSON snapshots for saving and reloading a session.

pub mod runtime;
pub mod snapshot;
mod spec;

pub use runtime::{Runtime, RuntimeParseError};
pub use snapshot::JobSnapshot;
pub use spec::*;
