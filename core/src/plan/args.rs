use serde_json::{Map, Value};

use super::literal::parse_literal;
use super::patterns::reference_regex;
use super::scan::{find_keyword, split_top_level, strip_unbalanced_close};

/// Key holding the whole argument text when the capability declares no
/// argument names (unknown capabilities and `join`).
pub const RAW_ARGUMENTS_KEY: &str = "input";

/// Parses an action line's argument text into an ordered argument map.
///
/// `declared` lists the target capability's argument names in declaration
/// order. Keyword values are located by their top-level `name=` occurrence;
/// when no declared keyword appears, top-level comma-separated values are
/// bound positionally. Values that are not literals keep their raw text.
pub fn parse_arguments(raw: &str, declared: &[String]) -> Map<String, Value> {
    let raw = raw.trim();
    let mut arguments = Map::new();
    if raw.is_empty() {
        return arguments;
    }
    if declared.is_empty() {
        arguments.insert(RAW_ARGUMENTS_KEY.to_string(), Value::String(raw.to_string()));
        return arguments;
    }

    let mut keywords: Vec<(usize, usize, &str)> = declared
        .iter()
        .filter_map(|name| {
            find_keyword(raw, name).map(|(name_start, value_start)| {
                (name_start, value_start, name.as_str())
            })
        })
        .collect();
    keywords.sort_by_key(|(name_start, _, _)| *name_start);

    let positional_end = keywords.first().map_or(raw.len(), |(start, _, _)| *start);
    let positional = raw[..positional_end].trim();
    if !positional.is_empty() {
        let free_names = declared
            .iter()
            .filter(|name| !keywords.iter().any(|(_, _, kw)| *kw == name.as_str()));
        let values = split_top_level(positional, ',')
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>();
        let mut values = values.into_iter();
        for (name, text) in free_names.zip(values.by_ref()) {
            arguments.insert(name.clone(), evaluate(text));
        }
        let extra = values.count();
        if extra > 0 {
            tracing::debug!(
                target: "llmc.parser",
                extra,
                "dropping positional arguments beyond declared names"
            );
        }
    }

    for (i, (_, value_start, name)) in keywords.iter().enumerate() {
        let value_end = keywords
            .get(i + 1)
            .map_or(raw.len(), |(next_start, _, _)| *next_start);
        arguments.insert(name.to_string(), evaluate(&raw[*value_start..value_end]));
    }

    arguments
}

fn evaluate(text: &str) -> Value {
    let text = text.trim().trim_end_matches(',').trim_end();
    let text = strip_unbalanced_close(text);
    parse_literal(text).unwrap_or_else(|| Value::String(text.to_string()))
}

/// Every task index referenced (`$N` / `${N}`) anywhere inside `value`,
/// in order of appearance.
pub fn references_in(value: &Value) -> Vec<u32> {
    let mut found = Vec::new();
    collect_references(value, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut Vec<u32>) {
    match value {
        Value::String(text) => references_in_text(text, found),
        Value::Array(items) => {
            for item in items {
                collect_references(item, found);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                references_in_text(key, found);
                collect_references(item, found);
            }
        }
        _ => {}
    }
}

fn references_in_text(text: &str, found: &mut Vec<u32>) {
    found.extend(
        reference_regex()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok()),
    );
}
