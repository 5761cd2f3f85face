//! `@import` flattening.
//!
//! Each import rule is replaced by the imported sheet's content, fetched
//! through the pass's session and re-based so its relative references keep
//! working after the splice. Media-qualified imports are wrapped in an
//! equivalent `@media` block. A rule whose target cannot be fetched stays
//! in the sheet verbatim; a rule that imports an ancestor of itself is
//! dropped.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::fetch::Fetch;
use crate::url_norm;

use super::absolutize_urls;

/// Import chains deeper than this keep their rules in place.
const MAX_IMPORT_DEPTH: usize = 64;

/// State for one flattening run: the active import chain and a cache of
/// sheets already flattened during this run.
#[derive(Default)]
pub struct ImportState {
    stack: Vec<String>,
    cache: HashMap<String, String>,
}

impl ImportState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Flatten every reachable `@import` in `css` (located at `base_url`) into
/// one stylesheet.
pub fn flatten_imports(
    css: &str,
    base_url: &str,
    fetcher: &mut dyn Fetch,
    state: &mut ImportState,
) -> String {
    state.stack.push(base_url.to_string());
    let out = flatten_inner(css, base_url, fetcher, state);
    state.stack.pop();
    out
}

fn flatten_inner(
    css: &str,
    base_url: &str,
    fetcher: &mut dyn Fetch,
    state: &mut ImportState,
) -> String {
    #[derive(PartialEq)]
    enum Scan {
        Normal,
        SingleQuote,
        DoubleQuote,
        Comment,
    }

    let bytes = css.as_bytes();
    let mut out = String::with_capacity(css.len());
    let mut scan = Scan::Normal;
    let mut last_emit = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match scan {
            Scan::Comment => {
                if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    scan = Scan::Normal;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            Scan::SingleQuote | Scan::DoubleQuote => {
                let quote = if scan == Scan::SingleQuote { b'\'' } else { b'"' };
                if bytes[i] == b'\\' {
                    i += 2;
                } else {
                    if bytes[i] == quote {
                        scan = Scan::Normal;
                    }
                    i += 1;
                }
            }
            Scan::Normal => {
                if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
                    scan = Scan::Comment;
                    i += 2;
                    continue;
                }
                if bytes[i] == b'\'' {
                    scan = Scan::SingleQuote;
                    i += 1;
                    continue;
                }
                if bytes[i] == b'"' {
                    scan = Scan::DoubleQuote;
                    i += 1;
                    continue;
                }
                let at_import = bytes[i] == b'@'
                    && css[i + 1..]
                        .get(..6)
                        .map_or(false, |s| s.eq_ignore_ascii_case("import"));
                if !at_import {
                    i += 1;
                    continue;
                }

                let Some(end) = find_rule_end(css, i) else {
                    // Unterminated rule; nothing after it can be an import.
                    break;
                };
                let rule = &css[i..end];

                match parse_import_target(rule) {
                    Some((target, media)) => {
                        out.push_str(&css[last_emit..i]);
                        splice_import(&target, &media, rule, base_url, fetcher, state, &mut out);
                        last_emit = end;
                        i = end;
                    }
                    None => {
                        // Not actually an import rule we understand.
                        i += 1;
                    }
                }
            }
        }
    }

    out.push_str(&css[last_emit..]);
    out
}

/// Byte offset one past the `;` ending the rule starting at `start`,
/// skipping over strings and comments.
fn find_rule_end(css: &str, start: usize) -> Option<usize> {
    let bytes = css.as_bytes();
    let mut i = start;
    let mut in_quote: Option<u8> = None;
    let mut in_comment = false;
    while i < bytes.len() {
        let b = bytes[i];
        if in_comment {
            if b == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                in_comment = false;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }
        if let Some(q) = in_quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                in_quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                in_comment = true;
                i += 2;
            }
            b'\'' | b'"' => {
                in_quote = Some(b);
                i += 1;
            }
            b';' => return Some(i + 1),
            b'{' => return None,
            _ => i += 1,
        }
    }
    None
}

/// Pull the target URL and trailing media query out of one `@import` rule.
fn parse_import_target(rule: &str) -> Option<(String, String)> {
    let after_at = rule
        .get(..7)
        .filter(|s| s.eq_ignore_ascii_case("@import"))
        .map(|_| rule[7..].trim_start())?;
    let body = after_at.strip_suffix(';').unwrap_or(after_at).trim();

    if body.get(..4).map_or(false, |s| s.eq_ignore_ascii_case("url(")) {
        let close = body.find(')')?;
        let target = body[4..close].trim().trim_matches('"').trim_matches('\'');
        let media = body[close + 1..].trim();
        if target.is_empty() {
            return None;
        }
        return Some((target.to_string(), media.to_string()));
    }

    let quote = body.chars().next()?;
    if quote == '"' || quote == '\'' {
        let rest = &body[1..];
        let close = rest.find(quote)?;
        let target = &rest[..close];
        let media = rest[close + 1..].trim();
        if target.is_empty() {
            return None;
        }
        return Some((target.to_string(), media.to_string()));
    }

    None
}

fn splice_import(
    target: &str,
    media: &str,
    rule: &str,
    base_url: &str,
    fetcher: &mut dyn Fetch,
    state: &mut ImportState,
    out: &mut String,
) {
    let resolved = match url_norm::join(base_url, target) {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::warn!(target, error = %err, "unresolvable @import target, keeping rule");
            out.push_str(rule);
            return;
        }
    };

    if state.stack.iter().any(|seen| *seen == resolved) {
        tracing::debug!(url = %resolved, "dropping cyclic @import");
        return;
    }
    if state.stack.len() > MAX_IMPORT_DEPTH {
        tracing::warn!(url = %resolved, "import chain too deep, keeping rule");
        out.push_str(rule);
        return;
    }

    let flattened = if let Some(cached) = state.cache.get(&resolved) {
        cached.clone()
    } else {
        match fetcher.fetch(&resolved) {
            Ok(resource) => {
                let rebased = absolutize_urls(&resource.text, &resolved);
                let flattened = flatten_imports(&rebased, &resolved, fetcher, state);
                state.cache.insert(resolved.clone(), flattened.clone());
                flattened
            }
            Err(err) => {
                tracing::warn!(url = %resolved, error = %err, "cannot fetch @import, keeping rule");
                out.push_str(rule);
                return;
            }
        }
    };

    if media.is_empty() || media.eq_ignore_ascii_case("all") {
        out.push_str(&flattened);
    } else {
        let _ = write!(out, "@media {media} {{\n{flattened}\n}}\n");
    }
}
