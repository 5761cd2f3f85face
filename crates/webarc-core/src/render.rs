//! Render pass: substitute a template's placeholders with data URIs.
//!
//! CSS assets render recursively (their own placeholders are resolved
//! first) and embed as percent-encoded `data:text/css` URIs; everything
//! else embeds as base64. Every token must have a ledger entry; a missing
//! one means the archive and its metadata have diverged, which is a hard
//! error rather than a silently broken page.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::ledger::Ledger;
use crate::store::AssetStore;
use crate::template;

/// Render failures callers can match on.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A template references a token the ledger does not know.
    #[error("no ledger entry for placeholder `{token}`")]
    MissingMetadata { token: String },
    /// A chain of CSS templates reached itself again.
    #[error("placeholder cycle detected at `{token}`")]
    TemplateCycle { token: String },
    /// A token that cannot be split back into an asset file name.
    #[error("malformed placeholder token `{token}`")]
    MalformedToken { token: String },
}

/// Render the archived template for `url` and write the self-contained
/// document to `out`.
pub fn render_to_file(store: &AssetStore, url: &str, out: &Path) -> Result<()> {
    let ledger = Ledger::load(&store.metadata_file())?;

    let template_file = store.template_html_file(url);
    let text = fs::read_to_string(&template_file).with_context(|| {
        format!(
            "read template {} (was {} archived?)",
            template_file.display(),
            url
        )
    })?;

    let mut renderer = Renderer::new(store, &ledger);
    let rendered = renderer.render(&text)?;

    fs::write(out, rendered)
        .with_context(|| format!("write rendered document {}", out.display()))?;
    tracing::info!(url, out = %out.display(), "rendered self-contained document");
    Ok(())
}

/// Recursive placeholder renderer. Tracks the chain of CSS templates being
/// rendered (cycle detection) and memoizes finished data URIs so shared
/// assets encode once.
pub struct Renderer<'a> {
    store: &'a AssetStore,
    ledger: &'a Ledger,
    resolving: Vec<String>,
    resolved: HashMap<String, String>,
}

impl<'a> Renderer<'a> {
    pub fn new(store: &'a AssetStore, ledger: &'a Ledger) -> Self {
        Renderer {
            store,
            ledger,
            resolving: Vec::new(),
            resolved: HashMap::new(),
        }
    }

    /// Substitute every placeholder in `text` with its data URI.
    pub fn render(&mut self, text: &str) -> Result<String> {
        let mut values = HashMap::new();
        for token in template::placeholders(text) {
            let data_uri = self.data_uri_for(&token)?;
            values.insert(token, data_uri);
        }
        Ok(template::substitute(text, &values))
    }

    fn data_uri_for(&mut self, token: &str) -> Result<String> {
        if let Some(done) = self.resolved.get(token) {
            return Ok(done.clone());
        }
        if self.resolving.iter().any(|t| t == token) {
            return Err(RenderError::TemplateCycle {
                token: token.to_string(),
            }
            .into());
        }

        // The ledger is the source of truth; an unknown token fails before
        // any disk access.
        let meta = self.ledger.get(token).ok_or_else(|| RenderError::MissingMetadata {
            token: token.to_string(),
        })?;

        let asset_path = self
            .store
            .asset_path_for_token(token)
            .ok_or_else(|| RenderError::MalformedToken {
                token: token.to_string(),
            })?;

        let data_uri = if meta.content_type == "text/css" {
            let nested = fs::read_to_string(&asset_path)
                .with_context(|| format!("read CSS asset {}", asset_path.display()))?;
            self.resolving.push(token.to_string());
            let rendered = self.render(&nested);
            self.resolving.pop();
            format!("data:text/css;charset=UTF-8,{}", percent_encode(&rendered?))
        } else {
            let bytes = fs::read(&asset_path)
                .with_context(|| format!("read asset {}", asset_path.display()))?;
            format!("data:{};base64,{}", meta.content_type, STANDARD.encode(bytes))
        };

        self.resolved.insert(token.to_string(), data_uri.clone());
        Ok(data_uri)
    }
}

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode for a data URI: RFC 3986 unreserved characters and `/`
/// stay bare, every other byte of the UTF-8 form becomes `%XX`.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => {
                out.push('%');
                out.push(HEX_UPPER[(b >> 4) as usize] as char);
                out.push(HEX_UPPER[(b & 0x0f) as usize] as char);
            }
        }
    }
    out
}
