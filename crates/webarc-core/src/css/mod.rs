//! CSS reference rewriting.
//!
//! A token-level walk over a stylesheet (or a bare declaration block) that
//! rewrites `url(...)` references and leaves every other byte as it was.
//! Splicing against the original source preserves formatting, comments,
//! and whatever the author wrote that a re-serializer would normalize away.

mod imports;

pub use imports::{flatten_imports, ImportState};

use anyhow::Result;
use cssparser::{Parser, ParserInput, Token};

use crate::resolve::Resolve;
use crate::url_norm;

/// Rewrite every `url()` reference in `css` through `resolver`, with
/// `base_url` as the context for relative references.
///
/// References inside `@import` and `@namespace` preludes are left alone:
/// imports are flattened beforehand, and a rule that survived flattening
/// must keep its original target.
pub fn rewrite_urls(css: &str, base_url: &str, resolver: &mut dyn Resolve) -> Result<String> {
    rewrite_url_tokens(css, &mut |raw| resolver.resolve(raw, base_url).map(Some), true)
}

/// Rewrite every `url()` reference in `css` to its absolute form against
/// `base_url`. Used when splicing an imported sheet into its parent, so
/// relative references survive the relocation. References that cannot be
/// resolved stay untouched.
pub fn absolutize_urls(css: &str, base_url: &str) -> String {
    rewrite_url_tokens(css, &mut |raw| Ok(absolutize_one(base_url, raw)), false)
        .unwrap_or_else(|_| css.to_string())
}

fn absolutize_one(base_url: &str, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') || reference.starts_with("data:") {
        return None;
    }
    url_norm::join(base_url, reference).ok()
}

/// Escape a replacement for a double-quoted CSS url string.
fn escape_css_url(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\0a "),
            '\r' => escaped.push_str("\\0d "),
            '\t' => escaped.push_str("\\09 "),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn rewrite_url_tokens(
    css: &str,
    replace: &mut dyn FnMut(&str) -> Result<Option<String>>,
    skip_import_preludes: bool,
) -> Result<String> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    rewrite_in_parser(&mut parser, replace, skip_import_preludes, css.len())
}

fn rewrite_in_parser<'i>(
    parser: &mut Parser<'i, '_>,
    replace: &mut dyn FnMut(&str) -> Result<Option<String>>,
    skip_import_preludes: bool,
    capacity_hint: usize,
) -> Result<String> {
    let mut out = String::with_capacity(capacity_hint);
    let mut last_emitted = parser.position();
    // True between an @import/@namespace keyword and the end of its rule.
    let mut in_skipped_prelude = false;

    loop {
        let token_start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        match token {
            Token::AtKeyword(ref name)
                if skip_import_preludes
                    && (name.eq_ignore_ascii_case("import")
                        || name.eq_ignore_ascii_case("namespace")) =>
            {
                in_skipped_prelude = true;
            }
            Token::Semicolon => {
                in_skipped_prelude = false;
            }
            Token::UnquotedUrl(ref url_value) if !in_skipped_prelude => {
                let raw = url_value.as_ref().to_string();
                out.push_str(parser.slice(last_emitted..token_start));

                match replace(&raw)? {
                    Some(replacement) => {
                        out.push_str("url(\"");
                        out.push_str(&escape_css_url(&replacement));
                        out.push_str("\")");
                    }
                    None => out.push_str(parser.slice_from(token_start)),
                }

                last_emitted = parser.position();
            }
            Token::Function(ref name)
                if !in_skipped_prelude && name.eq_ignore_ascii_case("url") =>
            {
                // url("…") tokenizes as a function with a string argument.
                let parse_result = parser.parse_nested_block(|nested| {
                    let mut arg: Option<String> = None;
                    loop {
                        match nested.next_including_whitespace_and_comments() {
                            Ok(Token::QuotedString(s)) | Ok(Token::UnquotedUrl(s)) => {
                                arg = Some(s.as_ref().to_string());
                            }
                            Ok(Token::BadUrl(_)) => {
                                arg = None;
                            }
                            Ok(_) => {}
                            Err(_) => break,
                        }
                    }
                    Ok::<_, cssparser::ParseError<'i, ()>>(arg)
                });
                let after_block = parser.position();

                out.push_str(parser.slice(last_emitted..token_start));

                let mut emitted = false;
                if let Ok(Some(raw)) = parse_result {
                    if let Some(replacement) = replace(&raw)? {
                        out.push_str("url(\"");
                        out.push_str(&escape_css_url(&replacement));
                        out.push_str("\")");
                        emitted = true;
                    }
                }
                if !emitted {
                    out.push_str(parser.slice(token_start..after_block));
                }

                last_emitted = after_block;
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                if matches!(token, Token::CurlyBracketBlock) {
                    in_skipped_prelude = false;
                }

                let opener_end = parser.position();
                let mut nested_failure: Option<anyhow::Error> = None;
                let parse_result = parser.parse_nested_block(|nested| {
                    let rewritten =
                        match rewrite_in_parser(nested, replace, skip_import_preludes, 0) {
                            Ok(r) => r,
                            Err(err) => {
                                nested_failure = Some(err);
                                return Err(nested.new_custom_error(()));
                            }
                        };
                    // Position of the close delimiter, or end of input for a
                    // block left unclosed at EOF.
                    Ok::<_, cssparser::ParseError<'i, ()>>((rewritten, nested.position()))
                });
                let after_block = parser.position();

                out.push_str(parser.slice(last_emitted..token_start));
                if let Some(err) = nested_failure {
                    return Err(err);
                }
                match parse_result {
                    Ok((rewritten, inner_end)) => {
                        out.push_str(parser.slice(token_start..opener_end));
                        out.push_str(&rewritten);
                        out.push_str(parser.slice(inner_end..after_block));
                    }
                    Err(_) => out.push_str(parser.slice(token_start..after_block)),
                }

                last_emitted = after_block;
            }
            _ => {}
        }
    }

    out.push_str(parser.slice_from(last_emitted));
    Ok(out)
}
