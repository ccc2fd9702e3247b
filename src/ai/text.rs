//! Turning raw model output into a title and a body.

use std::sync::OnceLock;

use regex::Regex;

fn heading_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#+\s*").expect("valid heading regex"))
}

fn surrounding_quotes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^["']|["']$"#).expect("valid quote regex"))
}

/// Removes leading markdown heading markers (`## Title` -> `Title`).
pub fn strip_heading(line: &str) -> String {
    heading_marker().replace(line.trim(), "").trim().to_string()
}

/// Removes one leading and one trailing quote character.
pub fn strip_quotes(line: &str) -> String {
    surrounding_quotes().replace_all(line, "").trim().to_string()
}

/// Truncates to at most `max` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// First line is the title, everything after it is the body. Blank lines are kept.
pub fn split_first_line(text: &str) -> (String, String) {
    let text = text.trim();
    match text.split_once('\n') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (text.to_string(), String::new()),
    }
}

/// First non-blank line is the title, the remaining non-blank lines joined by `\n` are the body.
pub fn split_non_blank(text: &str) -> (String, String) {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let title = lines.next().unwrap_or_default().to_string();
    let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    (title, body)
}
