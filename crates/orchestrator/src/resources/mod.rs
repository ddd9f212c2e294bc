//! Scoped resources with guaranteed release.
//!
//! - [`RunGate`] / [`RunPermit`] - single-run admission

mod run_gate;

pub use run_gate::{RunGate, RunPermit};
