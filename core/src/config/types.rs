use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// `[[capabilities]]` entries turned into a registry by the plugins crate.
    #[serde(default)]
    pub capabilities: Vec<CapabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "llmc.scheduler=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Level for the `llmc.parser` target; falls back to `level`.
    #[serde(default)]
    pub parser_level: Option<String>,

    /// Level for the `llmc.scheduler` target; falls back to `level`.
    #[serde(default)]
    pub scheduler_level: Option<String>,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            parser_level: None,
            scheduler_level: None,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound on concurrently invoking tasks. Unset means unbounded.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Record the join task as an observation whose value is `"join"`.
    #[serde(default = "default_record_join")]
    pub record_join: bool,

    /// Stop consuming the plan once the join task has been seen.
    #[serde(default = "default_stop_after_join")]
    pub stop_after_join: bool,
}

fn default_record_join() -> bool {
    true
}

fn default_stop_after_join() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            record_join: default_record_join(),
            stop_after_join: default_stop_after_join(),
        }
    }
}

/// One configured capability.
///
/// ```toml
/// [[capabilities]]
/// name = "trip_planner"
/// kind = "template"
/// description = "trip_planner(destination: str, days: int) -> str"
/// arguments = ["destination", "days"]
/// template = "A {days}-day trip to {destination}"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityConfig {
    pub name: String,

    #[serde(default = "default_capability_kind")]
    pub kind: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub arguments: Vec<String>,

    /// Kind-specific settings (`template`, `field`, ...).
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

fn default_capability_kind() -> String {
    "echo".to_string()
}

impl CapabilityConfig {
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}
