use regex::Regex;
use std::sync::OnceLock;

static THOUGHT_REGEX: OnceLock<Regex> = OnceLock::new();
static ACTION_HEAD_REGEX: OnceLock<Regex> = OnceLock::new();
static TRAILER_REGEX: OnceLock<Regex> = OnceLock::new();
static REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();

/// `Thought: <text>` reasoning line.
pub(crate) fn thought_regex() -> &'static Regex {
    THOUGHT_REGEX.get_or_init(|| Regex::new(r"^Thought: (.*)$").expect("THOUGHT_REGEX is valid"))
}

/// `<n>. <identifier>(` prefix of an action line; the argument span is
/// matched separately so nested parentheses are not truncated.
pub(crate) fn action_head_regex() -> &'static Regex {
    ACTION_HEAD_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\. (\w+)\(").expect("ACTION_HEAD_REGEX is valid")
    })
}

/// What may follow the closing parenthesis: nothing, or a `#tag` annotation.
pub(crate) fn trailer_regex() -> &'static Regex {
    TRAILER_REGEX.get_or_init(|| Regex::new(r"^\s*(#\w+)?\s*$").expect("TRAILER_REGEX is valid"))
}

/// `$N` or `${N}`.
pub fn reference_regex() -> &'static Regex {
    REFERENCE_REGEX
        .get_or_init(|| Regex::new(r"\$\{?(\d+)\}?").expect("REFERENCE_REGEX is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_regex_forms() {
        let found: Vec<&str> = reference_regex()
            .captures_iter("a $1 b ${22} c $x")
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        assert_eq!(found, vec!["1", "22"]);
    }

    #[test]
    fn test_action_head() {
        let caps = action_head_regex().captures("3. search(query=\"x\")").unwrap();
        assert_eq!(&caps[1], "3");
        assert_eq!(&caps[2], "search");
        assert!(action_head_regex().captures("Thought: 1. no").is_none());
    }
}
