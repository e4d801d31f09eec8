use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::Semaphore;

use crate::capability::CapabilityRegistry;
use crate::plan::{Task, JOIN_CAPABILITY};

use super::output::EventEmitter;
use super::resolve::resolve_arguments;
use super::store::ObservationStore;
use super::types::{Observation, SchedulerEvent};

/// Everything a spawned task worker needs. Cheap to clone.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub registry: Arc<dyn CapabilityRegistry>,
    pub store: Arc<ObservationStore>,
    pub limiter: Option<Arc<Semaphore>>,
    pub events: EventEmitter,
}

/// Waits until every index in `waits_on` is observed, executes the task, and
/// records exactly one observation for its index.
#[tracing::instrument(
    name = "task",
    target = "llmc.scheduler",
    skip_all,
    fields(index = task.index, capability = %task.capability)
)]
pub(crate) async fn run_task(task: Task, waits_on: Vec<u32>, ctx: WorkerContext) {
    ctx.store.wait_for(&waits_on).await;

    // Permit is taken only once the task is ready to invoke.
    let _permit = match &ctx.limiter {
        Some(limiter) => limiter.clone().acquire_owned().await.ok(),
        None => None,
    };

    let started = Instant::now();
    let observation = execute(&task, &ctx).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    if observation.is_error() {
        tracing::warn!(target: "llmc.scheduler", value = %observation.value, "task failed");
    } else {
        tracing::debug!(target: "llmc.scheduler", duration_ms, "task complete");
    }

    if ctx.store.record(observation.clone()) {
        ctx.events.emit(SchedulerEvent::TaskComplete {
            observation,
            duration_ms,
        });
    }
}

async fn execute(task: &Task, ctx: &WorkerContext) -> Observation {
    let name = task.capability.as_str();
    if task.is_join() {
        return Observation::new(task.index, JOIN_CAPABILITY, JOIN_CAPABILITY);
    }

    let values = match ctx.store.values_for(&task.dependencies) {
        Ok(values) => values,
        Err(missing) => {
            return Observation::error(
                task.index,
                name,
                format!(
                    "Failed to resolve arguments for {name}. Error: missing observation for ${missing}"
                ),
            )
        }
    };
    let arguments = resolve_arguments(&task.arguments, &values);

    let Some(capability) = ctx.registry.lookup(name) else {
        return Observation::error(task.index, name, format!("Capability {name} not found."));
    };

    match AssertUnwindSafe(capability.invoke(&arguments))
        .catch_unwind()
        .await
    {
        Ok(Ok(value)) => Observation::new(task.index, name, value),
        Ok(Err(err)) => Observation::error(
            task.index,
            name,
            format!("Failed to execute {name}. Error: {err}"),
        ),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "capability panicked".to_string());
            Observation::error(
                task.index,
                name,
                format!("Failed to execute {name}. Error: {message}"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, InMemoryRegistry};
    use crate::error::CapabilityError;
    use crate::executor::graph::dependencies_for;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    struct Upper;

    #[async_trait]
    impl Capability for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn argument_names(&self) -> &[String] {
            &[]
        }

        async fn invoke(&self, args: &Map<String, Value>) -> Result<String, CapabilityError> {
            match args.get("text").and_then(Value::as_str) {
                Some("boom") => panic!("boom"),
                Some(text) => Ok(text.to_uppercase()),
                None => Err(CapabilityError::InvalidArguments("text is required".into())),
            }
        }
    }

    fn ctx(store: Arc<ObservationStore>) -> WorkerContext {
        WorkerContext {
            registry: Arc::new(InMemoryRegistry::new().with(Arc::new(Upper))),
            store,
            limiter: None,
            events: EventEmitter::new(None),
        }
    }

    async fn run(task: Task, store: &Arc<ObservationStore>) {
        let waits_on = task.dependencies.clone();
        run_task(task, waits_on, ctx(store.clone())).await;
    }

    fn task(index: u32, capability: &str, arguments: Value) -> Task {
        let Value::Object(arguments) = arguments else {
            unreachable!()
        };
        Task {
            index,
            capability: capability.to_string(),
            raw_arguments: String::new(),
            dependencies: dependencies_for(index, capability, &arguments),
            arguments,
            reasoning: None,
        }
    }

    #[tokio::test]
    async fn test_resolves_and_invokes() {
        let store = Arc::new(ObservationStore::seeded([Observation::new(1, "x", "paris")]));
        run(task(2, "upper", json!({"text": "$1 trip"})), &store).await;
        assert_eq!(store.get(2).unwrap().value, "PARIS TRIP");
    }

    #[tokio::test]
    async fn test_failures_become_error_observations() {
        let store = Arc::new(ObservationStore::new());
        run(task(1, "upper", json!({})), &store).await;
        run(task(2, "missing", json!({"input": "x"})), &store).await;
        run(task(3, "upper", json!({"text": "boom"})), &store).await;

        assert_eq!(
            store.get(1).unwrap().value,
            "ERROR: Failed to execute upper. Error: invalid arguments: text is required"
        );
        assert_eq!(store.get(2).unwrap().value, "ERROR: Capability missing not found.");
        assert_eq!(
            store.get(3).unwrap().value,
            "ERROR: Failed to execute upper. Error: boom"
        );
    }

    #[tokio::test]
    async fn test_join_is_recorded_not_invoked() {
        let store = Arc::new(ObservationStore::seeded([Observation::new(1, "x", "a")]));
        run(task(2, JOIN_CAPABILITY, json!({})), &store).await;
        let join = store.get(2).unwrap();
        assert_eq!(join.value, "join");
        assert_eq!(join.capability_name, "join");
    }
}
