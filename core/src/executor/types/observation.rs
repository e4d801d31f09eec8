use serde::{Deserialize, Serialize};

/// Prefix marking an observation whose value is an error message.
pub const ERROR_MARKER: &str = "ERROR:";

/// Recorded result of one task, keyed by its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub task_index: u32,

    pub capability_name: String,

    /// Stringified result, or an `ERROR:`-prefixed message
    pub value: String,

    /// Already present before this scheduling pass
    #[serde(skip)]
    pub from_prior_run: bool,
}

impl Observation {
    pub fn new(task_index: u32, capability_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            task_index,
            capability_name: capability_name.into(),
            value: value.into(),
            from_prior_run: false,
        }
    }

    pub fn error(task_index: u32, capability_name: impl Into<String>, message: impl AsRef<str>) -> Self {
        Self::new(
            task_index,
            capability_name,
            format!("{ERROR_MARKER} {}", message.as_ref()),
        )
    }

    pub fn is_error(&self) -> bool {
        self.value.starts_with(ERROR_MARKER)
    }
}
