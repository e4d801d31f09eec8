//! Quote- and nesting-aware scanning over argument text.
//!
//! Everything here works on byte offsets into the original `&str` so callers
//! can slice without copying.

/// Tracks whether the scanner is inside a quoted string literal.
#[derive(Debug, Default)]
pub(crate) struct QuoteTracker {
    quote: Option<char>,
    escaped: bool,
}

impl QuoteTracker {
    /// Feeds one char. Returns true when the char is structural, i.e. outside
    /// any string literal and not itself a quote delimiter.
    pub(crate) fn structural(&mut self, ch: char) -> bool {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == q {
                self.quote = None;
            }
            return false;
        }
        if ch == '"' || ch == '\'' {
            self.quote = Some(ch);
            return false;
        }
        true
    }

    pub(crate) fn in_string(&self) -> bool {
        self.quote.is_some()
    }
}

fn is_opener(ch: char) -> bool {
    matches!(ch, '(' | '[' | '{')
}

fn is_closer(ch: char) -> bool {
    matches!(ch, ')' | ']' | '}')
}

/// Byte offset of the `)` matching the `(` at `open`.
///
/// Returns `None` when the text runs out first, when a mismatched closer is
/// hit, or when a string literal is left open.
pub(crate) fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut quotes = QuoteTracker::default();
    let mut depth = 0usize;
    for (idx, ch) in text[open + 1..].char_indices() {
        if !quotes.structural(ch) {
            continue;
        }
        if is_opener(ch) {
            depth += 1;
        } else if is_closer(ch) {
            if depth == 0 {
                return (ch == ')').then_some(open + 1 + idx);
            }
            depth -= 1;
        }
    }
    None
}

/// Splits on `sep` occurrences that sit outside quotes and brackets.
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut quotes = QuoteTracker::default();
    let mut depth = 0usize;
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if !quotes.structural(ch) {
            continue;
        }
        if is_opener(ch) {
            depth += 1;
        } else if is_closer(ch) {
            depth = depth.saturating_sub(1);
        } else if ch == sep && depth == 0 {
            parts.push(&text[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Locates a top-level `name=` keyword.
///
/// Returns `(name_start, value_start)`. The name must start the text or
/// follow whitespace, `,` or `(`; whitespace around `=` is allowed and `==`
/// is not a keyword.
pub(crate) fn find_keyword(text: &str, name: &str) -> Option<(usize, usize)> {
    if name.is_empty() {
        return None;
    }
    let mut quotes = QuoteTracker::default();
    let mut depth = 0usize;
    let mut prev: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        let structural = quotes.structural(ch);
        if structural {
            if is_opener(ch) {
                depth += 1;
            } else if is_closer(ch) {
                depth = depth.saturating_sub(1);
            } else if depth == 0
                && prev.map_or(true, |p| p.is_whitespace() || p == ',' || p == '(')
                && text[idx..].starts_with(name)
            {
                if let Some(value_start) = keyword_value_start(text, idx + name.len()) {
                    return Some((idx, value_start));
                }
            }
        }
        prev = Some(ch);
    }
    None
}

fn keyword_value_start(text: &str, after_name: usize) -> Option<usize> {
    let rest = &text[after_name..];
    let trimmed = rest.trim_start();
    let eq = after_name + (rest.len() - trimmed.len());
    if !trimmed.starts_with('=') || trimmed.starts_with("==") {
        return None;
    }
    Some(eq + 1)
}

/// Drops one trailing `)` that has no matching `(` inside the value.
pub(crate) fn strip_unbalanced_close(text: &str) -> &str {
    let Some(stripped) = text.strip_suffix(')') else {
        return text;
    };
    let mut quotes = QuoteTracker::default();
    let mut balance: isize = 0;
    for ch in text.chars() {
        if !quotes.structural(ch) {
            continue;
        }
        match ch {
            '(' => balance += 1,
            ')' => balance -= 1,
            _ => {}
        }
    }
    if balance < 0 && !quotes.in_string() {
        stripped.trim_end()
    } else {
        text
    }
}
