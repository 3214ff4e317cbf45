//! Load-test screen runner: launches the stress workload, samples cluster
//! metrics until it finishes, then reports and persists what was collected.

pub mod logging;
pub mod report;
pub mod run;

pub use logging::init_logging;
pub use run::{execute, run, RunSummary};
