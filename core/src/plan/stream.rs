use futures::{Stream, StreamExt};
use std::sync::Arc;

use crate::capability::CapabilityRegistry;

use super::parser::PlanParser;
use super::types::Task;

/// Adapts a stream of plan text chunks into a lazy stream of tasks.
///
/// Tasks are yielded as soon as their line is complete, so a scheduler can
/// start executing early steps while the planner is still producing later
/// ones.
pub fn plan_stream<S, T>(chunks: S, registry: Arc<dyn CapabilityRegistry>) -> impl Stream<Item = Task>
where
    S: Stream<Item = T>,
    T: AsRef<str>,
{
    async_stream::stream! {
        let mut parser = PlanParser::new(registry);
        futures::pin_mut!(chunks);
        while let Some(chunk) = chunks.next().await {
            for task in parser.push(chunk.as_ref()) {
                yield task;
            }
        }
        for task in parser.finish() {
            yield task;
        }
    }
}
