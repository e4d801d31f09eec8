mod echo;
mod function;
mod template;

pub use echo::EchoCapability;
pub use function::{CapabilityFuture, FnCapability};
pub use template::TemplateCapability;

use serde_json::Value;

/// Text form of an argument value: strings as-is, anything else as JSON.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
