use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CapabilityError;

/// An invocable action a plan step can name.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Name used in plan action lines.
    fn name(&self) -> &str;

    /// One-line description for planner prompts.
    fn description(&self) -> &str {
        ""
    }

    /// Argument names in declaration order.
    fn argument_names(&self) -> &[String];

    /// Invoke with fully resolved arguments.
    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, CapabilityError>;
}

/// Lookup-by-name over the capabilities available to a plan.
pub trait CapabilityRegistry: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Arc<dyn Capability>>;

    /// Registered names, in registration order.
    fn names(&self) -> Vec<String>;
}

/// HashMap-backed registry that remembers registration order.
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
    order: Vec<String>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `capability`, returning the one it replaced, if any.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Option<Arc<dyn Capability>> {
        let name = capability.name().to_string();
        let previous = self.capabilities.insert(name.clone(), capability);
        if previous.is_none() {
            self.order.push(name);
        }
        previous
    }

    pub fn with(mut self, capability: Arc<dyn Capability>) -> Self {
        self.register(capability);
        self
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Numbered capability descriptions followed by the `join` entry, in the
    /// layout planner prompts list their tools.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (i, name) in self.order.iter().enumerate() {
            let description = self
                .capabilities
                .get(name)
                .map(|c| c.description())
                .filter(|d| !d.is_empty())
                .unwrap_or(name.as_str());
            out.push_str(&format!("{}. {}\n", i + 1, description));
        }
        out.push_str(&format!(
            "{}. join(): Collects and combines results from prior actions.\n",
            self.order.len() + 1
        ));
        out
    }
}

impl CapabilityRegistry for InMemoryRegistry {
    fn lookup(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.order.clone()
    }
}

impl std::fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("capabilities", &self.order)
            .finish()
    }
}
