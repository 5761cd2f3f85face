//! Placeholder syntax shared by the archive and render passes.
//!
//! A placeholder is `$$${token}`. The triple-dollar delimiter cannot occur
//! in legitimate HTML, CSS, or URL text, so substitution never collides
//! with page content.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\$\$\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid")
    })
}

/// Wrap a bare token in the placeholder delimiter.
pub fn wrap(token: &str) -> String {
    format!("$$${{{token}}}")
}

/// The bare token inside `text`, if `text` is exactly one placeholder.
pub fn unwrap(text: &str) -> Option<&str> {
    text.strip_prefix("$$${")?.strip_suffix('}')
}

/// Distinct tokens referenced by `text`, in first-appearance order.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for caps in placeholder_pattern().captures_iter(text) {
        let token = &caps[1];
        if seen.insert(token.to_string()) {
            out.push(token.to_string());
        }
    }
    out
}

/// Replace every placeholder whose token has a value. Tokens without one
/// stay in place; callers decide beforehand whether that is an error.
pub fn substitute(text: &str, values: &HashMap<String, String>) -> String {
    placeholder_pattern()
        .replace_all(text, |caps: &regex::Captures<'_>| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
