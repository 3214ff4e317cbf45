//! Launching and supervising the external load workload.

pub mod command;
pub mod error;
pub mod supervisor;

pub use command::{graph_file, log_file, WorkloadSpec, RUN_ID_FORMAT};
pub use error::{WorkloadError, WorkloadResult};
pub use supervisor::{ProcessSupervisor, WorkloadHandle, WorkloadState, WorkloadSummary};
