//! Canonical URL normalization.
//!
//! Two references are the same asset iff they normalize to the same string:
//! resolve against the base, drop query and fragment, percent-decode.

use anyhow::{Context, Result};
use url::Url;

/// Resolve `reference` against `base` without any canonicalization beyond
/// what URL resolution itself does. Query and fragment survive.
pub fn join(base: &str, reference: &str) -> Result<String> {
    let base = Url::parse(base).with_context(|| format!("invalid base URL {base}"))?;
    let joined = base
        .join(reference)
        .with_context(|| format!("cannot resolve {reference} against {base}"))?;
    Ok(joined.into())
}

/// Canonical form of `reference` as seen from `base`: absolute, no query,
/// no fragment, percent-escapes decoded. This string is what gets hashed,
/// so every spelling of one asset collapses to one identity.
pub fn normalize(base: &str, reference: &str) -> Result<String> {
    let base = Url::parse(base).with_context(|| format!("invalid base URL {base}"))?;
    let mut joined = base
        .join(reference)
        .with_context(|| format!("cannot resolve {reference} against {base}"))?;
    joined.set_query(None);
    joined.set_fragment(None);
    Ok(percent_decode(joined.as_str()))
}

/// Percent-decode `input`, leaving malformed escapes untouched. Bytes that
/// do not form valid UTF-8 decode lossily.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(high << 4 | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/pages/index.html";

    #[test]
    fn join_keeps_query_and_fragment() {
        let joined = join(BASE, "style.css?v=3#frag").unwrap();
        assert_eq!(joined, "https://example.com/pages/style.css?v=3#frag");
    }

    #[test]
    fn relative_reference_resolves_against_base() {
        let n = normalize(BASE, "img/logo.png").unwrap();
        assert_eq!(n, "https://example.com/pages/img/logo.png");
    }

    #[test]
    fn parent_directory_references_collapse() {
        let n = normalize(BASE, "../shared/logo.png").unwrap();
        assert_eq!(n, "https://example.com/shared/logo.png");
    }

    #[test]
    fn absolute_reference_passes_through() {
        let n = normalize(BASE, "https://cdn.example.net/x.woff2").unwrap();
        assert_eq!(n, "https://cdn.example.net/x.woff2");
    }

    #[test]
    fn protocol_relative_reference_takes_base_scheme() {
        let n = normalize(BASE, "//cdn.example.net/x.woff2").unwrap();
        assert_eq!(n, "https://cdn.example.net/x.woff2");
    }

    #[test]
    fn query_and_fragment_are_stripped() {
        let n = normalize(BASE, "logo.png?version=2#top").unwrap();
        assert_eq!(n, "https://example.com/pages/logo.png");
    }

    #[test]
    fn escaped_and_literal_spellings_collapse() {
        let a = normalize(BASE, "fonts/Site%20Font.woff2").unwrap();
        let b = normalize(BASE, "fonts/Site Font.woff2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "https://example.com/pages/fonts/Site Font.woff2");
    }

    #[test]
    fn malformed_escapes_survive_decoding() {
        assert_eq!(percent_decode("100%zz"), "100%zz");
        assert_eq!(percent_decode("a%2"), "a%2");
        assert_eq!(percent_decode("%41%42"), "AB");
    }

    #[test]
    fn invalid_base_is_an_error() {
        assert!(normalize("not a url", "x.png").is_err());
    }
}
