//! Runtime orchestration layer for the RevOps dashboard.
//!
//! Loads the datasets and runs the independent aggregators on the tokio
//! blocking pool, then hands the summaries to the payload assembler.

pub mod orchestrator;

pub use revops_core as core;
pub use revops_data as data;
