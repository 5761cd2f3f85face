//! `webarc archive` – snapshot a page and its assets into an archive directory.

use anyhow::Result;
use std::path::Path;
use webarc_core::archive::Archiver;
use webarc_core::config::WebarcConfig;

pub fn run_archive(cfg: &WebarcConfig, url: &str, dir: &Path) -> Result<()> {
    let archiver = Archiver::open(dir, cfg.fetch_options())?;
    let summary = archiver.archive_url(url)?;

    println!("Archived {} ({} new assets)", url, summary.assets_recorded);
    println!("  raw:      {}", summary.raw_file.display());
    println!("  template: {}", summary.template_file.display());
    Ok(())
}
