pub mod capability;
pub mod executor;

pub use capability::CapabilityError;
pub use executor::{ErrorCode, ExecutorError};
