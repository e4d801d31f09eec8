use serde::Serialize;

use super::observation::Observation;

/// Progress notifications emitted while a plan executes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerEvent {
    RunStart {
        prior_observations: usize,
    },
    TaskDispatched {
        task_index: u32,
        capability: String,
    },
    /// Dispatched, but waiting on observations that are not recorded yet.
    TaskDeferred {
        task_index: u32,
        waiting_on: Vec<u32>,
    },
    TaskComplete {
        observation: Observation,
        duration_ms: u64,
    },
    RunEnd {
        total_tasks: usize,
        failed: usize,
        duration_ms: u64,
    },
}

/// A [`SchedulerEvent`] stamped with its run and wall-clock time.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub run_id: String,
    pub ts: String,
    #[serde(flatten)]
    pub event: SchedulerEvent,
}

pub type EventsTx = tokio::sync::mpsc::UnboundedSender<EventEnvelope>;
pub type EventsRx = tokio::sync::mpsc::UnboundedReceiver<EventEnvelope>;
