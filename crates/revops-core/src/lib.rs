//! Shared types for the RevOps dashboard: input record models, the error
//! type, numeric helpers, console formatting and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;

pub use error::{DashboardError, Result};
