//! Asset resolution: one reference in, one replacement out, with the fetch
//! and persistence side effects in between.
//!
//! The resolver is threaded explicitly through the HTML walk and the CSS
//! rewrite. Everything it touches (the store, the ledger, the fetch
//! session) is handed to it at construction, so a resolver's lifetime is
//! exactly one archive pass.

use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;

use crate::css;
use crate::fetch::Fetch;
use crate::ledger::{AssetMeta, Ledger};
use crate::store::AssetStore;
use crate::template;
use crate::token;
use crate::url_norm;

/// Replacement capability for references found during the document walk.
pub trait Resolve {
    /// Resolve one reference found at `base_url` into its replacement text:
    /// a placeholder for fetched assets, or the reference itself (possibly
    /// normalized) when nothing is fetched.
    fn resolve(&mut self, reference: &str, base_url: &str) -> Result<String>;

    /// Flatten and rewrite a whole stylesheet located at `base_url`.
    fn resolve_stylesheet(&mut self, css: &str, base_url: &str) -> Result<String>;
}

/// The archive pass resolver.
pub struct AssetResolver<'a> {
    store: &'a AssetStore,
    ledger: &'a mut Ledger,
    session: &'a mut dyn Fetch,
    /// Tokens currently being persisted somewhere up the call stack.
    /// A stylesheet chain that reaches one of these again gets the
    /// placeholder straight back instead of fetching forever.
    in_flight: HashSet<String>,
}

impl<'a> AssetResolver<'a> {
    pub fn new(
        store: &'a AssetStore,
        ledger: &'a mut Ledger,
        session: &'a mut dyn Fetch,
    ) -> Self {
        AssetResolver {
            store,
            ledger,
            session,
            in_flight: HashSet::new(),
        }
    }

    fn fetch_and_persist(&mut self, canonical: &str, token: &str, asset_path: &Path) -> Result<()> {
        let resource = self.session.fetch(canonical)?;

        self.ledger.insert(
            token.to_string(),
            AssetMeta {
                content_type: resource.content_type.clone(),
                url: canonical.to_string(),
            },
        );

        if resource.content_type == "text/css" {
            let rewritten = self.resolve_stylesheet(&resource.text, canonical)?;
            self.store.write_asset_text(asset_path, &rewritten)?;
        } else if resource.content_type.starts_with("text") {
            self.store.write_asset_text(asset_path, &resource.text)?;
        } else {
            self.store.write_asset_bytes(asset_path, &resource.bytes)?;
        }

        tracing::debug!(url = %canonical, token, content_type = %resource.content_type, "archived asset");
        Ok(())
    }
}

impl Resolve for AssetResolver<'_> {
    fn resolve(&mut self, reference: &str, base_url: &str) -> Result<String> {
        let reference = reference.trim();

        // An empty reference would join back to the document's own URL;
        // data: and fragment references are already self-contained.
        if reference.is_empty() || reference.starts_with("data:") || reference.starts_with('#') {
            return Ok(reference.to_string());
        }

        let canonical = url_norm::normalize(base_url, reference)?;
        let extension = token::url_extension(&canonical);
        if !token::is_asset_extension(&extension) {
            return Ok(canonical);
        }

        let token = token::token_for_url(&canonical);
        let placeholder = template::wrap(&token);
        let asset_path = self.store.asset_path_for_url(&canonical);

        if asset_path.exists() || self.in_flight.contains(&token) {
            tracing::debug!(url = %canonical, token, "asset already present, skipping fetch");
            return Ok(placeholder);
        }

        self.in_flight.insert(token.clone());
        let persisted = self.fetch_and_persist(&canonical, &token, &asset_path);
        self.in_flight.remove(&token);
        persisted?;

        Ok(placeholder)
    }

    fn resolve_stylesheet(&mut self, css: &str, base_url: &str) -> Result<String> {
        let mut imports = css::ImportState::new();
        let flattened = css::flatten_imports(css, base_url, self.session, &mut imports);
        css::rewrite_urls(&flattened, base_url, self)
    }
}
