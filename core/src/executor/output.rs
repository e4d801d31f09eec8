use chrono::Local;
use uuid::Uuid;

use super::types::{EventEnvelope, EventsTx, SchedulerEvent};

/// Stamps scheduler events with the run id and forwards them to an optional
/// listener. Sending is best effort; a closed receiver is not an error.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    run_id: String,
    tx: Option<EventsTx>,
}

impl EventEmitter {
    pub fn new(tx: Option<EventsTx>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            tx,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn emit(&self, event: SchedulerEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        let envelope = EventEnvelope {
            run_id: self.run_id.clone(),
            ts: Local::now().to_rfc3339(),
            event,
        };
        if tx.send(envelope).is_err() {
            tracing::trace!(target: "llmc.scheduler", "event receiver closed");
        }
    }
}
