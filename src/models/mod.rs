//! Data models module
//!
//! Phase results and the run summary.

pub mod result;

pub use result::{OperationStats, Phase, PhaseResult, RunReport};
