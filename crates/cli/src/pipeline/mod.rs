//! Pipeline orchestration module.

mod orchestrator;
mod stats;
mod workload;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
