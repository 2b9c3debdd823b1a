//! Runtime orchestrator: runs the country-year and subfield sweeps, the
//! trend analysis and the topic-graph pass in order, and collects every
//! query failure into one report.

pub mod orchestrator;
pub mod types;

pub use orchestrator::Orchestrator;
pub use types::*;
