//! Reference substitution.
//!
//! `$N` and `${N}` tokens in argument strings are replaced with the value of
//! observation `N`. Tokens for indices without an observation stay as they
//! are; resolution never fails.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::plan::reference_regex;

use super::types::Observation;

/// Read access to observation values by task index.
pub trait ObservationLookup {
    fn observation_value(&self, index: u32) -> Option<String>;
}

impl ObservationLookup for HashMap<u32, String> {
    fn observation_value(&self, index: u32) -> Option<String> {
        self.get(&index).cloned()
    }
}

impl ObservationLookup for BTreeMap<u32, Observation> {
    fn observation_value(&self, index: u32) -> Option<String> {
        self.get(&index).map(|obs| obs.value.clone())
    }
}

/// Replaces every reference token in `text` in a single pass, so substituted
/// values are never themselves rescanned.
pub fn resolve_text(text: &str, observations: &impl ObservationLookup) -> String {
    reference_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            caps.get(1)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .and_then(|index| observations.observation_value(index))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Strings are substituted, arrays element-wise, objects key- and
/// value-wise; other scalars pass through.
pub fn resolve_value(value: &Value, observations: &impl ObservationLookup) -> Value {
    match value {
        Value::String(text) => Value::String(resolve_text(text, observations)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_value(item, observations))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    (
                        resolve_text(key, observations),
                        resolve_value(item, observations),
                    )
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

pub fn resolve_arguments(
    arguments: &Map<String, Value>,
    observations: &impl ObservationLookup,
) -> Map<String, Value> {
    arguments
        .iter()
        .map(|(name, value)| (name.clone(), resolve_value(value, observations)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observed() -> HashMap<u32, String> {
        HashMap::from([
            (1, "Paris".to_string()),
            (2, "costs $1".to_string()),
        ])
    }

    #[test]
    fn test_resolve_both_token_forms() {
        assert_eq!(
            resolve_text("weather in $1, ${1} tomorrow", &observed()),
            "weather in Paris, Paris tomorrow"
        );
    }

    #[test]
    fn test_missing_reference_left_verbatim() {
        assert_eq!(resolve_text("$1 and ${7}", &observed()), "Paris and ${7}");
    }

    #[test]
    fn test_substituted_values_not_rescanned() {
        assert_eq!(resolve_text("$2", &observed()), "costs $1");
    }

    #[test]
    fn test_reference_free_values_unchanged() {
        let value = json!({"q": "no tokens here", "n": 3, "flags": [true, null, "$ 5"]});
        assert_eq!(resolve_value(&value, &observed()), value);
        let again = resolve_value(&resolve_value(&value, &observed()), &observed());
        assert_eq!(again, value);
    }

    #[test]
    fn test_resolve_nested_values() {
        let Value::Object(args) = json!({
            "query": "$1",
            "list": ["${1}", 4, ["$2"]],
            "info": {"city": "$1"}
        }) else {
            unreachable!()
        };
        let resolved = resolve_arguments(&args, &observed());
        assert_eq!(
            Value::Object(resolved),
            json!({
                "query": "Paris",
                "list": ["Paris", 4, ["costs $1"]],
                "info": {"city": "Paris"}
            })
        );
    }

    #[test]
    fn test_dict_keys_are_resolved() {
        let value = json!({"$1": "${1} trip", "${9}": 1});
        assert_eq!(
            resolve_value(&value, &observed()),
            json!({"Paris": "Paris trip", "${9}": 1})
        );
    }

    #[test]
    fn test_lookup_from_observation_map() {
        let map = BTreeMap::from([(1, Observation::new(1, "search", "42"))]);
        assert_eq!(resolve_text("answer=$1", &map), "answer=42");
    }
}
