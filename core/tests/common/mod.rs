#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use llmc_core::api::{Capability, CapabilityError, InMemoryRegistry, ObservationStore};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn arg<'a>(args: &'a Map<String, Value>, name: &str) -> &'a str {
    args.get(name).and_then(Value::as_str).unwrap_or_default()
}

/// `Search(query)`: echoes its resolved query.
pub struct Search {
    args: Vec<String>,
}

impl Search {
    pub fn new() -> Self {
        Self {
            args: names(&["query"]),
        }
    }
}

#[async_trait]
impl Capability for Search {
    fn name(&self) -> &str {
        "Search"
    }

    fn argument_names(&self) -> &[String] {
        &self.args
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, CapabilityError> {
        Ok(arg(args, "query").to_string())
    }
}

/// `sleep(label, ms)`: waits, then returns the label.
pub struct Sleep {
    args: Vec<String>,
}

impl Sleep {
    pub fn new() -> Self {
        Self {
            args: names(&["label", "ms"]),
        }
    }
}

#[async_trait]
impl Capability for Sleep {
    fn name(&self) -> &str {
        "sleep"
    }

    fn argument_names(&self) -> &[String] {
        &self.args
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, CapabilityError> {
        let ms = args.get("ms").and_then(Value::as_u64).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(arg(args, "label").to_string())
    }
}

/// `fail(query)`: always fails.
pub struct Fail {
    args: Vec<String>,
}

impl Fail {
    pub fn new() -> Self {
        Self {
            args: names(&["query"]),
        }
    }
}

#[async_trait]
impl Capability for Fail {
    fn name(&self) -> &str {
        "fail"
    }

    fn argument_names(&self) -> &[String] {
        &self.args
    }

    async fn invoke(&self, _args: &Map<String, Value>) -> Result<String, CapabilityError> {
        Err(CapabilityError::Failed("service unavailable".to_string()))
    }
}

/// `probe(tag)`: records which observation indices existed when it ran.
pub struct Probe {
    args: Vec<String>,
    store: Arc<ObservationStore>,
    seen: Mutex<Vec<(String, Vec<u32>)>>,
}

impl Probe {
    pub fn new(store: Arc<ObservationStore>) -> Self {
        Self {
            args: names(&["tag", "after"]),
            store,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<(String, Vec<u32>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Capability for Probe {
    fn name(&self) -> &str {
        "probe"
    }

    fn argument_names(&self) -> &[String] {
        &self.args
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, CapabilityError> {
        let tag = arg(args, "tag").to_string();
        self.seen
            .lock()
            .unwrap()
            .push((tag.clone(), self.store.indices()));
        // Stagger completion so dependents genuinely wait.
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(tag)
    }
}

pub fn registry() -> Arc<InMemoryRegistry> {
    Arc::new(
        InMemoryRegistry::new()
            .with(Arc::new(Search::new()))
            .with(Arc::new(Sleep::new()))
            .with(Arc::new(Fail::new())),
    )
}

/// Splits `text` into chunks of `size` characters.
pub fn chunked(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
