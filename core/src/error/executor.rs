use thiserror::Error;

/// Error codes surfaced to callers when a plan cannot be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    GeneralError = 1,
    ValidationError = 3,
    DependencyError = 11,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Graph-shape errors that abort a scheduling pass.
///
/// Per-task runtime failures never show up here; they are recorded as
/// error-valued observations instead.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Duplicate task index: {0}")]
    DuplicateTaskIndex(u32),

    #[error("Task index {index} does not follow previous index {previous}")]
    NonIncreasingIndex { index: u32, previous: u32 },

    #[error("Forward reference: task {task_index} references ${dependency}")]
    ForwardReference { task_index: u32, dependency: u32 },

    #[error("Dangling reference: task {task_index} references ${dependency}, which is never produced")]
    DanglingReference { task_index: u32, dependency: u32 },

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl ExecutorError {
    /// Map executor error to protocol error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateTaskIndex(_) | Self::NonIncreasingIndex { .. } => {
                ErrorCode::ValidationError
            }
            Self::ForwardReference { .. } | Self::DanglingReference { .. } => {
                ErrorCode::DependencyError
            }
            Self::Worker(_) => ErrorCode::GeneralError,
        }
    }
}
