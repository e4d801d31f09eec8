use thiserror::Error;

/// Failure raised by a capability invocation.
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("invocation failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
