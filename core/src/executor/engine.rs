use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, Stream, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::capability::CapabilityRegistry;
use crate::config::SchedulerConfig;
use crate::error::ExecutorError;
use crate::plan::{plan_stream, PlanParser, Task};

use super::graph::TaskGraph;
use super::output::EventEmitter;
use super::scheduler::{run_task, WorkerContext};
use super::store::ObservationStore;
use super::types::{EventsTx, Observation, SchedulerEvent};

/// Executes task streams against a capability registry.
///
/// Each task is spawned as soon as it arrives; tasks with outstanding
/// dependencies wait inside their own worker, so the scheduling loop never
/// blocks on a single task.
pub struct Scheduler {
    registry: Arc<dyn CapabilityRegistry>,
    config: SchedulerConfig,
    events: Option<EventsTx>,
}

pub struct SchedulerBuilder {
    registry: Arc<dyn CapabilityRegistry>,
    config: SchedulerConfig,
    events: Option<EventsTx>,
}

impl SchedulerBuilder {
    pub fn new(registry: Arc<dyn CapabilityRegistry>) -> Self {
        Self {
            registry,
            config: SchedulerConfig::default(),
            events: None,
        }
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = Some(max_concurrency);
        self
    }

    pub fn record_join(mut self, record_join: bool) -> Self {
        self.config.record_join = record_join;
        self
    }

    pub fn stop_after_join(mut self, stop_after_join: bool) -> Self {
        self.config.stop_after_join = stop_after_join;
        self
    }

    pub fn events(mut self, tx: EventsTx) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn build(self) -> Scheduler {
        Scheduler {
            registry: self.registry,
            config: self.config,
            events: self.events,
        }
    }
}

impl Scheduler {
    pub fn new(registry: Arc<dyn CapabilityRegistry>, config: SchedulerConfig) -> Self {
        SchedulerBuilder::new(registry).config(config).build()
    }

    pub fn builder(registry: Arc<dyn CapabilityRegistry>) -> SchedulerBuilder {
        SchedulerBuilder::new(registry)
    }

    pub fn registry(&self) -> &Arc<dyn CapabilityRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs every task from `tasks` and returns the observations produced by
    /// this pass, ordered by index.
    ///
    /// `store` may be seeded with a prior pass; those indices are valid
    /// reference targets but are never returned. A malformed graph stops task
    /// intake; workers already dispatched still finish before the error is
    /// returned. Dropping the returned future detaches in-flight workers,
    /// which keep writing into `store`.
    pub async fn schedule<S>(
        &self,
        tasks: S,
        store: Arc<ObservationStore>,
    ) -> Result<Vec<Observation>, ExecutorError>
    where
        S: Stream<Item = Task>,
    {
        let started = Instant::now();
        let events = EventEmitter::new(self.events.clone());
        let ctx = WorkerContext {
            registry: self.registry.clone(),
            store: store.clone(),
            limiter: self
                .config
                .max_concurrency
                .filter(|n| *n > 0)
                .map(|n| Arc::new(Semaphore::new(n))),
            events: events.clone(),
        };

        let prior = store.len();
        tracing::info!(
            target: "llmc.scheduler",
            run_id = %events.run_id(),
            prior_observations = prior,
            max_concurrency = ?self.config.max_concurrency,
            "scheduling plan"
        );
        events.emit(SchedulerEvent::RunStart {
            prior_observations: prior,
        });

        let mut graph = TaskGraph::with_prior(store.indices());
        let mut workers = FuturesUnordered::new();
        let mut failure = None;
        let mut intake_open = true;

        futures::pin_mut!(tasks);
        loop {
            tokio::select! {
                next = tasks.next(), if intake_open => {
                    let Some(task) = next else {
                        intake_open = false;
                        continue;
                    };
                    let waits_on = match graph.admit(&task) {
                        Ok(waits_on) => waits_on,
                        Err(err) => {
                            tracing::warn!(target: "llmc.scheduler", error = %err, "rejecting plan");
                            failure = Some(err);
                            intake_open = false;
                            continue;
                        }
                    };

                    let is_join = task.is_join();
                    if is_join && self.config.stop_after_join {
                        intake_open = false;
                    }
                    if is_join && !self.config.record_join {
                        graph.retract(task.index);
                        tracing::debug!(target: "llmc.scheduler", index = task.index, "join not recorded");
                        continue;
                    }

                    let index = task.index;
                    let capability = task.capability.clone();
                    let handle = self.dispatch(task, waits_on, &ctx);
                    workers.push(async move { (index, capability, handle.await) });
                }
                Some((index, capability, joined)) = workers.next(), if !workers.is_empty() => {
                    settle(&store, index, &capability, joined);
                }
                else => break,
            }
        }

        let indices = graph.task_indices();
        let observations = store.observations_for(&indices);
        let failed = observations.iter().filter(|obs| obs.is_error()).count();
        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            target: "llmc.scheduler",
            run_id = %events.run_id(),
            total_tasks = indices.len(),
            failed,
            duration_ms,
            "plan finished"
        );
        events.emit(SchedulerEvent::RunEnd {
            total_tasks: indices.len(),
            failed,
            duration_ms,
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(observations),
        }
    }

    /// Parses `text` in one go and schedules the result.
    pub async fn schedule_plan(
        &self,
        text: &str,
        store: Arc<ObservationStore>,
    ) -> Result<Vec<Observation>, ExecutorError> {
        let tasks = PlanParser::parse_all(self.registry.clone(), text);
        self.schedule(futures::stream::iter(tasks), store).await
    }

    /// Parses plan text as it arrives and schedules tasks as soon as each
    /// action line completes.
    pub async fn schedule_stream<S, T>(
        &self,
        chunks: S,
        store: Arc<ObservationStore>,
    ) -> Result<Vec<Observation>, ExecutorError>
    where
        S: Stream<Item = T>,
        T: AsRef<str>,
    {
        let tasks = plan_stream(chunks, self.registry.clone());
        self.schedule(tasks, store).await
    }

    fn dispatch(
        &self,
        task: Task,
        waits_on: Vec<u32>,
        ctx: &WorkerContext,
    ) -> tokio::task::JoinHandle<()> {
        let waiting_on = ctx.store.missing(&waits_on);
        if waiting_on.is_empty() {
            tracing::debug!(target: "llmc.scheduler", index = task.index, "dispatching ready task");
            ctx.events.emit(SchedulerEvent::TaskDispatched {
                task_index: task.index,
                capability: task.capability.clone(),
            });
        } else {
            tracing::debug!(
                target: "llmc.scheduler",
                index = task.index,
                waiting_on = ?waiting_on,
                "deferring task until dependencies complete"
            );
            ctx.events.emit(SchedulerEvent::TaskDeferred {
                task_index: task.index,
                waiting_on,
            });
        }
        tokio::spawn(run_task(task, waits_on, ctx.clone()))
    }
}

/// A worker that died without recording still owes its index an observation,
/// otherwise dependents would wait forever.
fn settle(store: &ObservationStore, index: u32, capability: &str, joined: Result<(), JoinError>) {
    let Err(err) = joined else {
        return;
    };
    if store.contains(index) {
        return;
    }
    tracing::warn!(target: "llmc.scheduler", index, error = %err, "task worker died");
    let error = ExecutorError::Worker(err.to_string());
    store.record(Observation::error(
        index,
        capability,
        format!("Failed to execute {capability}. Error: {error}"),
    ));
}
