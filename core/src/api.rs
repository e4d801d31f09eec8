//! Stable re-exports for consumers (`plugins` and external crates).
//!
//! Prefer importing from `llmc_core::api` instead of reaching into internal modules.

pub use crate::capability::{Capability, CapabilityRegistry, InMemoryRegistry};
pub use crate::config::{
    load_default, load_from_path, AppConfig, CapabilityConfig, LoggingConfig, SchedulerConfig,
};
pub use crate::error::{CapabilityError, ErrorCode, ExecutorError};
pub use crate::executor::{
    dependencies_for, resolve_arguments, resolve_value, EventEnvelope, EventsRx, EventsTx,
    Observation, ObservationLookup, ObservationStore, Scheduler, SchedulerBuilder, SchedulerEvent,
    TaskGraph, ERROR_MARKER,
};
pub use crate::logging::{filter_directives, init_tracing};
pub use crate::plan::{
    parse_arguments, plan_stream, references_in, PlanParser, Task, JOIN_CAPABILITY,
    RAW_ARGUMENTS_KEY,
};
