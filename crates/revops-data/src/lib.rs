//! Dataset loading and the metrics aggregation engine for the RevOps
//! dashboard.
//!
//! The aggregators in [`marketing`], [`pipeline`] and [`revenue`] are pure
//! functions over their own record slices; [`analysis`] wires them together
//! with the [`trends`] synthesizer into a single payload. [`reader`] is the
//! only module that touches the filesystem.

pub mod analysis;
pub mod marketing;
pub mod pipeline;
pub mod reader;
pub mod revenue;
pub mod trends;

pub use analysis::{assemble, build_dashboard, DashboardInputs, DashboardPayload};
pub use revops_core as core;
