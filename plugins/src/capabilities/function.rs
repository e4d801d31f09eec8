use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use llmc_core::api::{Capability, CapabilityError};

pub type CapabilityFuture = BoxFuture<'static, Result<String, CapabilityError>>;

type Handler = Arc<dyn Fn(Map<String, Value>) -> CapabilityFuture + Send + Sync>;

/// Wraps an async closure as a [`Capability`].
///
/// ```ignore
/// let search = FnCapability::new("search", ["query"], |args| async move {
///     Ok(format!("results for {}", args["query"]))
/// });
/// ```
#[derive(Clone)]
pub struct FnCapability {
    name: String,
    description: String,
    arguments: Vec<String>,
    handler: Handler,
}

impl FnCapability {
    pub fn new<I, S, F, Fut>(name: impl Into<String>, arguments: I, handler: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, CapabilityError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            arguments: arguments.into_iter().map(Into::into).collect(),
            handler: Arc::new(move |args| -> CapabilityFuture { Box::pin(handler(args)) }),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Capability for FnCapability {
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
        (self.handler)(args.clone()).await
    }
}

impl std::fmt::Debug for FnCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCapability")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish()
    }
}
