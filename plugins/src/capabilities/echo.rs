use async_trait::async_trait;
use serde_json::{Map, Value};

use llmc_core::api::{Capability, CapabilityError};

use super::value_text;

/// Returns one argument's value, or all arguments as JSON when no field is
/// selected.
#[derive(Debug, Clone)]
pub struct EchoCapability {
    name: String,
    description: String,
    arguments: Vec<String>,
    field: Option<String>,
}

impl EchoCapability {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            arguments,
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Capability for EchoCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn argument_names(&self) -> &[String] {
        &self.arguments
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, CapabilityError> {
        match &self.field {
            Some(field) => args.get(field).map(value_text).ok_or_else(|| {
                CapabilityError::InvalidArguments(format!("missing argument `{field}`"))
            }),
            None => serde_json::to_string(args).map_err(|e| CapabilityError::Other(e.into())),
        }
    }
}
