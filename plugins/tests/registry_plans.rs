use std::sync::Arc;

use serde_json::Value;

use llmc_core::api::{
    CapabilityError, InMemoryRegistry, ObservationStore, Scheduler, SchedulerConfig,
};
use llmc_core::config::load_from_str;
use llmc_plugins::capabilities::FnCapability;
use llmc_plugins::factory::build_registry;

const CONFIG: &str = r#"
[scheduler]
max_concurrency = 2

[[capabilities]]
name = "search"
arguments = ["query"]
field = "query"

[[capabilities]]
name = "trip_planner"
kind = "template"
arguments = ["destination", "days", "notes"]
template = "{days} days in {destination}: {notes}"
"#;

#[tokio::test]
async fn configured_registry_runs_a_plan() {
    let cfg = load_from_str(CONFIG).unwrap();
    let registry = Arc::new(build_registry(&cfg).unwrap());
    let scheduler = Scheduler::new(registry, cfg.scheduler.clone());

    let plan = "Thought: check the weather, then plan\n\
                1. search(query=\"Cancun weather\")\n\
                2. trip_planner(destination=\"Cancun\", days=5, notes=\"$1\")\n\
                3. join()\n";
    let out = scheduler
        .schedule_plan(plan, Arc::new(ObservationStore::new()))
        .await
        .unwrap();

    let values: Vec<&str> = out.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(
        values,
        vec!["Cancun weather", "5 days in Cancun: Cancun weather", "join"]
    );
}

#[tokio::test]
async fn closure_capabilities_see_resolved_arguments() {
    let registry = InMemoryRegistry::new()
        .with(Arc::new(FnCapability::new("lookup", ["city"], |args| async move {
            match args.get("city").and_then(Value::as_str) {
                Some("Paris") => Ok("France".to_string()),
                Some(other) => Err(CapabilityError::Failed(format!("unknown city {other}"))),
                None => Err(CapabilityError::InvalidArguments("city".to_string())),
            }
        })))
        .with(Arc::new(FnCapability::new("shout", ["text"], |args| async move {
            Ok(args
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_uppercase())
        })));

    let out = Scheduler::new(Arc::new(registry), SchedulerConfig::default())
        .schedule_plan(
            "1. lookup(\"Paris\")\n2. lookup(city=\"Oslo\")\n3. shout(text=\"$1 / $2\")\n",
            Arc::new(ObservationStore::new()),
        )
        .await
        .unwrap();

    assert_eq!(out[0].value, "France");
    assert!(out[1].is_error());
    assert_eq!(
        out[2].value,
        "FRANCE / ERROR: FAILED TO EXECUTE LOOKUP. ERROR: INVOCATION FAILED: UNKNOWN CITY OSLO"
    );
}
