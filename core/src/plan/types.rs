use serde::Serialize;
use serde_json::{Map, Value};

/// Capability name of the terminal aggregation step.
pub const JOIN_CAPABILITY: &str = "join";

/// One parsed step of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    /// 1-based plan line number, unique per plan run.
    pub index: u32,

    /// Capability name, or [`JOIN_CAPABILITY`].
    pub capability: String,

    /// Unparsed text between the outer parentheses of the action line.
    pub raw_arguments: String,

    /// Arguments parsed from `raw_arguments`, in declaration order.
    pub arguments: Map<String, Value>,

    /// Sorted indices whose observations must exist before this task runs.
    pub dependencies: Vec<u32>,

    /// Most recent `Thought:` line preceding this task.
    pub reasoning: Option<String>,
}

impl Task {
    pub fn is_join(&self) -> bool {
        self.capability == JOIN_CAPABILITY
    }
}
