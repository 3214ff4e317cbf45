use thiserror::Error;

/// Errors raised while launching or supervising the load workload.
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// The executable could not be started.
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading output or waiting on the process failed.
    #[error("I/O error while supervising workload: {0}")]
    Io(#[from] std::io::Error),

    /// The process ran to completion but reported failure.
    #[error("workload exited with {}", describe_exit(.code))]
    Exited { code: Option<i32> },

    /// The supervising task panicked or was aborted.
    #[error("workload supervisor task failed: {0}")]
    Join(String),
}

impl WorkloadError {
    pub fn launch(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for WorkloadError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Self::Join("cancelled".to_string())
        } else {
            Self::Join(err.to_string())
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

pub type WorkloadResult<T> = Result<T, WorkloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_messages() {
        assert_eq!(
            WorkloadError::Exited { code: Some(2) }.to_string(),
            "workload exited with status 2"
        );
        assert!(WorkloadError::Exited { code: None }
            .to_string()
            .contains("signal"));
    }
}
