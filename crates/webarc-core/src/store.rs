//! Archive directory layout and asset persistence.
//!
//! One archive root holds page snapshots and templates; a shared `assets/`
//! subdirectory holds every fetched asset, named by URL hash. A file that
//! already exists on disk is the dedup signal: it is never fetched again.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::token;

/// Ledger file name inside the archive root.
pub const METADATA_FILE: &str = "metadata.json";

/// Subdirectory of the archive root holding fetched assets.
pub const ASSETS_DIR: &str = "assets";

/// An archive directory on disk.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    assets_dir: PathBuf,
}

impl AssetStore {
    /// Open the archive rooted at `root`, creating the layout if missing.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let assets_dir = root.join(ASSETS_DIR);
        fs::create_dir_all(&assets_dir)
            .with_context(|| format!("create archive directory {}", assets_dir.display()))?;
        Ok(AssetStore { root, assets_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/metadata.json`.
    pub fn metadata_file(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// `<root>/_<sha1(url)>.raw.html`: the page exactly as fetched.
    pub fn raw_html_file(&self, url: &str) -> PathBuf {
        self.root.join(format!("{}.raw.html", token::url_hash(url)))
    }

    /// `<root>/_<sha1(url)>.template.html`: the rewritten page.
    pub fn template_html_file(&self, url: &str) -> PathBuf {
        self.root
            .join(format!("{}.template.html", token::url_hash(url)))
    }

    /// Where the asset behind a canonical URL lives.
    pub fn asset_path_for_url(&self, url: &str) -> PathBuf {
        self.assets_dir.join(token::asset_file_name_for_url(url))
    }

    /// Where the asset behind a placeholder token lives, or `None` when the
    /// token cannot name a file.
    pub fn asset_path_for_token(&self, token: &str) -> Option<PathBuf> {
        token::asset_file_name_for_token(token)
            .map(|name| self.assets_dir.join(name))
    }

    /// Persist a text asset as UTF-8, whatever charset it arrived in.
    pub fn write_asset_text(&self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, text).with_context(|| format!("write asset {}", path.display()))
    }

    /// Persist a binary asset verbatim.
    pub fn write_asset_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes).with_context(|| format!("write asset {}", path.display()))
    }
}
