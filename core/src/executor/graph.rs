use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ExecutorError;
use crate::plan::{references_in, Task, JOIN_CAPABILITY};

/// Dependency set of a task.
///
/// `join` depends on every earlier index; any other task depends on the
/// sorted, de-duplicated indices referenced across its argument values.
pub fn dependencies_for(index: u32, capability: &str, arguments: &Map<String, Value>) -> Vec<u32> {
    if capability == JOIN_CAPABILITY {
        return (1..index).collect();
    }
    let mut dependencies: Vec<u32> = arguments.values().flat_map(references_in).collect();
    dependencies.sort_unstable();
    dependencies.dedup();
    dependencies
}

/// Task dependency graph for one scheduling pass, built as tasks arrive.
///
/// Dependencies only point backward and indices only increase, so by the time
/// a task arrives every index it depends on must already be known: either
/// observed in a prior pass or admitted earlier in this one. That makes
/// dangling references detectable on arrival instead of by waiting forever.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    /// Indices that have, or will have, an observation.
    known: BTreeSet<u32>,

    /// Dependency edges: task index -> indices it depends on
    edges: BTreeMap<u32, Vec<u32>>,

    last_index: Option<u32>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph for a continuation pass over previously observed indices.
    pub fn with_prior(prior: impl IntoIterator<Item = u32>) -> Self {
        Self {
            known: prior.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Validates `task` against the graph so far and adds it.
    ///
    /// Returns the indices the task must wait for. For `join` these are the
    /// earlier indices that are actually known, since a plan line that failed
    /// to parse leaves a gap that will never be observed.
    pub fn admit(&mut self, task: &Task) -> Result<Vec<u32>, ExecutorError> {
        let index = task.index;
        if self.known.contains(&index) {
            return Err(ExecutorError::DuplicateTaskIndex(index));
        }
        if let Some(previous) = self.last_index.filter(|previous| index <= *previous) {
            return Err(ExecutorError::NonIncreasingIndex { index, previous });
        }

        let waits_on = if task.is_join() {
            let known: Vec<u32> = self.known.range(1..index).copied().collect();
            if known.len() < task.dependencies.len() {
                tracing::debug!(
                    target: "llmc.scheduler",
                    index,
                    planned = known.len(),
                    "join skips indices that were never planned"
                );
            }
            known
        } else {
            for &dependency in &task.dependencies {
                if dependency == 0 || dependency >= index {
                    return Err(ExecutorError::ForwardReference {
                        task_index: index,
                        dependency,
                    });
                }
                if !self.known.contains(&dependency) {
                    return Err(ExecutorError::DanglingReference {
                        task_index: index,
                        dependency,
                    });
                }
            }
            task.dependencies.clone()
        };

        self.known.insert(index);
        self.edges.insert(index, waits_on.clone());
        self.last_index = Some(index);
        Ok(waits_on)
    }

    /// Forgets an admitted task that will never be observed, so later
    /// references to it are reported as dangling. Index ordering still
    /// counts it.
    pub fn retract(&mut self, index: u32) {
        self.known.remove(&index);
        self.edges.remove(&index);
    }

    /// Tasks admitted in this pass, in index order.
    pub fn task_indices(&self) -> Vec<u32> {
        self.edges.keys().copied().collect()
    }

    pub fn dependencies(&self, index: u32) -> Option<&[u32]> {
        self.edges.get(&index).map(Vec::as_slice)
    }

    /// Tasks admitted in this pass that directly depend on `index`.
    pub fn dependents(&self, index: u32) -> Vec<u32> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.contains(&index))
            .map(|(task, _)| *task)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(index: u32, capability: &str, arguments: Value) -> Task {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let dependencies = dependencies_for(index, capability, &arguments);
        Task {
            index,
            capability: capability.to_string(),
            raw_arguments: String::new(),
            arguments,
            dependencies,
            reasoning: None,
        }
    }

    #[test]
    fn test_dependencies_from_references() {
        let args = json!({"a": "${2} and $1", "b": ["$2"], "c": 7});
        let Value::Object(map) = args else { unreachable!() };
        assert_eq!(dependencies_for(5, "search", &map), vec![1, 2]);
    }

    #[test]
    fn test_join_depends_on_all_previous() {
        assert_eq!(dependencies_for(4, JOIN_CAPABILITY, &Map::new()), vec![1, 2, 3]);
        assert!(dependencies_for(1, JOIN_CAPABILITY, &Map::new()).is_empty());
        let Value::Object(map) = json!({"input": "$9"}) else { unreachable!() };
        assert_eq!(dependencies_for(3, JOIN_CAPABILITY, &map), vec![1, 2]);
    }

    #[test]
    fn test_admit_valid_plan() {
        let mut graph = TaskGraph::new();
        graph.admit(&task(1, "search", json!({"q": "a"}))).unwrap();
        graph.admit(&task(2, "search", json!({"q": "$1"}))).unwrap();
        graph.admit(&task(3, JOIN_CAPABILITY, json!({}))).unwrap();

        assert_eq!(graph.task_indices(), vec![1, 2, 3]);
        assert_eq!(graph.dependencies(3), Some(&[1, 2][..]));
        assert_eq!(graph.dependents(1), vec![2, 3]);
    }

    #[test]
    fn test_admit_rejects_bad_shapes() {
        let mut graph = TaskGraph::new();
        graph.admit(&task(1, "search", json!({}))).unwrap();

        assert!(matches!(
            graph.admit(&task(1, "search", json!({}))),
            Err(ExecutorError::DuplicateTaskIndex(1))
        ));
        assert!(matches!(
            graph.admit(&task(3, "search", json!({"q": "$2"}))),
            Err(ExecutorError::DanglingReference { task_index: 3, dependency: 2 })
        ));
        assert!(matches!(
            graph.admit(&task(4, "search", json!({"q": "$4"}))),
            Err(ExecutorError::ForwardReference { task_index: 4, dependency: 4 })
        ));
        assert!(matches!(
            graph.admit(&task(2, "search", json!({"q": "$0"}))),
            Err(ExecutorError::ForwardReference { dependency: 0, .. })
        ));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_admit_rejects_decreasing_index() {
        let mut graph = TaskGraph::new();
        graph.admit(&task(5, "search", json!({}))).unwrap();
        assert!(matches!(
            graph.admit(&task(3, "search", json!({}))),
            Err(ExecutorError::NonIncreasingIndex { index: 3, previous: 5 })
        ));
    }

    #[test]
    fn test_prior_observations_satisfy_references() {
        let mut graph = TaskGraph::with_prior([1, 2]);
        graph.admit(&task(3, "search", json!({"q": "$1 $2"}))).unwrap();
        assert!(matches!(
            graph.admit(&task(2, "search", json!({}))),
            Err(ExecutorError::DuplicateTaskIndex(2))
        ));
        assert_eq!(graph.task_indices(), vec![3]);
    }

    #[test]
    fn test_retracted_task_is_dangling() {
        let mut graph = TaskGraph::new();
        graph.admit(&task(1, "search", json!({}))).unwrap();
        graph.admit(&task(2, JOIN_CAPABILITY, json!({}))).unwrap();
        graph.retract(2);

        assert!(matches!(
            graph.admit(&task(3, "search", json!({"q": "$2"}))),
            Err(ExecutorError::DanglingReference { dependency: 2, .. })
        ));
        assert!(matches!(
            graph.admit(&task(2, "search", json!({}))),
            Err(ExecutorError::NonIncreasingIndex { index: 2, previous: 2 })
        ));
        assert_eq!(graph.task_indices(), vec![1]);
    }

    #[test]
    fn test_join_waits_only_on_planned_indices() {
        let mut graph = TaskGraph::with_prior([1]);
        graph.admit(&task(3, "search", json!({}))).unwrap();
        let join = task(5, JOIN_CAPABILITY, json!({}));
        assert_eq!(join.dependencies, vec![1, 2, 3, 4]);
        assert_eq!(graph.admit(&join).unwrap(), vec![1, 3]);
        assert_eq!(graph.dependencies(5), Some(&[1, 3][..]));
    }
}
