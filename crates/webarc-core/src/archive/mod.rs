//! Archive pass driver: fetch a page, rewrite it into a placeholder
//! template, and persist the raw snapshot, assets, ledger, and template.

mod walk;

pub use walk::rewrite_document;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dom::serialize;
use crate::fetch::{Fetch, FetchOptions, HttpSession};
use crate::ledger::Ledger;
use crate::render;
use crate::resolve::AssetResolver;
use crate::store::AssetStore;

/// One archive directory plus the fetch options used to fill it.
pub struct Archiver {
    store: AssetStore,
    options: FetchOptions,
}

/// What one archive pass produced.
#[derive(Debug)]
pub struct ArchiveSummary {
    /// Ledger entries added by this pass.
    pub assets_recorded: usize,
    /// Where the verbatim page snapshot went.
    pub raw_file: PathBuf,
    /// Where the rewritten template went.
    pub template_file: PathBuf,
}

impl Archiver {
    /// Open (or create) the archive at `dir`.
    pub fn open(dir: impl AsRef<Path>, options: FetchOptions) -> Result<Self> {
        Ok(Archiver {
            store: AssetStore::open(dir)?,
            options,
        })
    }

    /// Archive `url` into `dir` with default options. Convenience for
    /// one-shot callers.
    pub fn archive_simple(url: &str, dir: impl AsRef<Path>) -> Result<ArchiveSummary> {
        Archiver::open(dir, FetchOptions::default())?.archive_url(url)
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Run one archive pass for `url`. The HTTP session lives exactly as
    /// long as this call.
    pub fn archive_url(&self, url: &str) -> Result<ArchiveSummary> {
        let mut session = HttpSession::new(&self.options)?;
        self.archive_url_with(url, &mut session)
    }

    /// Archive pass with an explicit fetch capability. Tests inject fakes
    /// through here.
    pub fn archive_url_with(&self, url: &str, session: &mut dyn Fetch) -> Result<ArchiveSummary> {
        tracing::info!(url, dir = %self.store.root().display(), "archiving page");

        let page = session.fetch(url)?;
        tracing::debug!(url, encoding = %page.encoding, "page fetched");

        let raw_file = self.store.raw_html_file(url);
        fs::write(&raw_file, &page.bytes)
            .with_context(|| format!("write raw snapshot {}", raw_file.display()))?;

        let mut ledger = Ledger::load_or_default(&self.store.metadata_file())?;
        let entries_before = ledger.len();

        let mut document = scraper::Html::parse_document(&page.text);
        {
            let mut resolver = AssetResolver::new(&self.store, &mut ledger, session);
            walk::rewrite_document(&mut document, url, &mut resolver)?;
        }

        // The ledger is complete once the walk finishes; scripts go last so
        // their removal can never lose an already-recorded reference.
        ledger.save(&self.store.metadata_file())?;
        walk::strip_scripts(&mut document);

        let template_file = self.store.template_html_file(url);
        fs::write(&template_file, serialize::to_html(&document))
            .with_context(|| format!("write template {}", template_file.display()))?;

        let summary = ArchiveSummary {
            assets_recorded: ledger.len() - entries_before,
            raw_file,
            template_file,
        };
        tracing::info!(
            url,
            new_assets = summary.assets_recorded,
            total_assets = ledger.len(),
            "archive pass complete"
        );
        Ok(summary)
    }

    /// Render the previously archived `url` into one self-contained file
    /// at `out`.
    pub fn render_url(&self, url: &str, out: &Path) -> Result<()> {
        render::render_to_file(&self.store, url, out)
    }
}
