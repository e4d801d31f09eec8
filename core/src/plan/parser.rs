//! Incremental plan parser.
//!
//! Plan text arrives in arbitrary chunks (LLM tokens). Complete lines are
//! classified as they become available:
//!
//! ```text
//! Thought: I need the weather first       -> reasoning, no task
//! 1. search(query="weather in Paris")     -> Task #1
//! 2. search(query="${1} tomorrow") #E2    -> Task #2, trailing tag ignored
//! 3. join()                               -> Task #3 (depends on 1, 2)
//! ```
//!
//! Anything else is ignored.

use std::sync::Arc;

use crate::capability::CapabilityRegistry;
use crate::executor::graph::dependencies_for;

use super::args::parse_arguments;
use super::patterns::{action_head_regex, thought_regex, trailer_regex};
use super::scan::matching_paren;
use super::types::{Task, JOIN_CAPABILITY};

/// Largest accepted jump between consecutive action indices. `join` depends on
/// every earlier index, so an unbounded jump would size its dependency set by
/// whatever number the planner wrote.
pub const MAX_INDEX_STEP: u32 = 1024;

/// Stateful line-oriented parser; feed chunks with [`push`](Self::push) and
/// call [`finish`](Self::finish) at end of stream.
pub struct PlanParser {
    registry: Arc<dyn CapabilityRegistry>,
    buffer: String,
    reasoning: Option<String>,
    last_index: u32,
}

impl PlanParser {
    pub fn new(registry: Arc<dyn CapabilityRegistry>) -> Self {
        Self {
            registry,
            buffer: String::new(),
            reasoning: None,
            last_index: 0,
        }
    }

    /// Parses a complete plan in one go.
    pub fn parse_all(registry: Arc<dyn CapabilityRegistry>, text: &str) -> Vec<Task> {
        let mut parser = Self::new(registry);
        let mut tasks = parser.push(text);
        tasks.extend(parser.finish());
        tasks
    }

    /// Appends a chunk and returns the tasks completed by it.
    pub fn push(&mut self, chunk: &str) -> Vec<Task> {
        self.buffer.push_str(chunk);
        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let partial = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, partial);
        complete
            .lines()
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    /// Classifies whatever partial line is left and consumes the parser.
    pub fn finish(mut self) -> Vec<Task> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.strip_suffix('\r').unwrap_or(&rest);
        if rest.is_empty() {
            return Vec::new();
        }
        self.parse_line(rest).into_iter().collect()
    }

    /// Reasoning waiting to be attached to the next task.
    pub fn pending_reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    fn parse_line(&mut self, line: &str) -> Option<Task> {
        if let Some(caps) = thought_regex().captures(line) {
            self.reasoning = caps.get(1).map(|m| m.as_str().to_string());
            return None;
        }

        let Some(caps) = action_head_regex().captures(line) else {
            if !line.trim().is_empty() {
                tracing::debug!(target: "llmc.parser", line, "ignoring unrecognized plan line");
            }
            return None;
        };
        let (Some(index_match), Some(name_match), Some(head)) = (caps.get(1), caps.get(2), caps.get(0))
        else {
            return None;
        };

        let index = match index_match.as_str().parse::<u32>() {
            Ok(0) | Err(_) => {
                tracing::debug!(target: "llmc.parser", line, "ignoring action line with invalid index");
                return None;
            }
            Ok(index) if index > self.last_index.saturating_add(MAX_INDEX_STEP) => {
                tracing::debug!(
                    target: "llmc.parser",
                    index,
                    last_index = self.last_index,
                    "ignoring action line with out-of-range index"
                );
                return None;
            }
            Ok(index) => index,
        };

        let open = head.end() - 1;
        // An unterminated string literal breaks quote-aware matching; fall
        // back to the last `)` on the line.
        let close = matching_paren(line, open).or_else(|| {
            line.rfind(')').filter(|close| *close > open)
        });
        let Some(close) = close else {
            tracing::debug!(target: "llmc.parser", line, "ignoring action line without closing parenthesis");
            return None;
        };

        let trailer = &line[close + 1..];
        if !trailer_regex().is_match(trailer) {
            tracing::debug!(target: "llmc.parser", index, trailer, "ignoring trailing text after action");
        }

        let task = self.instantiate(index, name_match.as_str(), &line[open + 1..close]);
        self.last_index = self.last_index.max(index);
        tracing::debug!(
            target: "llmc.parser",
            index = task.index,
            capability = %task.capability,
            dependencies = ?task.dependencies,
            "parsed task"
        );
        Some(task)
    }

    fn instantiate(&mut self, index: u32, capability: &str, raw_arguments: &str) -> Task {
        let declared = if capability == JOIN_CAPABILITY {
            Vec::new()
        } else {
            self.registry
                .lookup(capability)
                .map(|c| c.argument_names().to_vec())
                .unwrap_or_default()
        };
        let arguments = parse_arguments(raw_arguments, &declared);
        let dependencies = dependencies_for(index, capability, &arguments);

        Task {
            index,
            capability: capability.to_string(),
            raw_arguments: raw_arguments.to_string(),
            arguments,
            dependencies,
            reasoning: self.reasoning.take(),
        }
    }
}
