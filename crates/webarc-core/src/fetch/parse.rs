//! Content-Type parsing and response body decoding.

use encoding_rs::{Encoding, UTF_8};

/// Split a raw `Content-Type` value into the bare media type and the
/// charset parameter, if any.
///
/// `text/css; charset=utf-8` becomes (`text/css`, `Some("utf-8")`).
pub fn parse_content_type(raw: &str) -> (String, Option<String>) {
    let mut parts = raw.split(';');
    let media_type = parts.next().unwrap_or("").trim().to_ascii_lowercase();

    let mut charset = None;
    for param in parts {
        if let Some((name, value)) = param.split_once('=') {
            if name.trim().eq_ignore_ascii_case("charset") {
                let value = value.trim().trim_matches('"');
                if !value.is_empty() {
                    charset = Some(value.to_string());
                }
            }
        }
    }

    (media_type, charset)
}

/// Decode `bytes` to text using the labelled charset when it names a known
/// encoding, falling back to UTF-8. A byte-order mark wins over the label.
/// Returns the name of the encoding actually used and the decoded text.
pub fn decode_body(bytes: &[u8], charset: Option<&str>) -> (String, String) {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, used, _had_errors) = encoding.decode(bytes);
    (used.name().to_string(), text.into_owned())
}
