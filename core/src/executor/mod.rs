//! Dependency-aware execution of parsed plans.
//!
//! ```text
//! Stream<Task>
//!   ↓
//! TaskGraph::admit()              rejects duplicate, out-of-order, forward and dangling references
//!   ↓
//! tokio::spawn(run_task)          one worker per task
//!   ↓
//! ObservationStore::wait_for()    suspends until dependencies are recorded
//!   ↓
//! resolve_arguments() → Capability::invoke() → ObservationStore::record()
//!   ↓
//! Vec<Observation>                new observations, ordered by index
//! ```

mod engine;
pub mod graph;
mod output;
pub mod resolve;
mod scheduler;
mod store;
pub mod types;

pub use engine::{Scheduler, SchedulerBuilder};
pub use graph::{dependencies_for, TaskGraph};
pub use output::EventEmitter;
pub use resolve::{resolve_arguments, resolve_text, resolve_value, ObservationLookup};
pub use store::ObservationStore;
pub use types::{
    EventEnvelope, EventsRx, EventsTx, Observation, SchedulerEvent, ERROR_MARKER,
};
