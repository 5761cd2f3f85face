//! `webarc info` – list the assets recorded in an archive directory.

use anyhow::Result;
use std::path::Path;
use webarc_core::ledger::Ledger;
use webarc_core::store::AssetStore;

pub fn run_info(dir: &Path) -> Result<()> {
    let store = AssetStore::open(dir)?;
    let metadata_file = store.metadata_file();
    if !metadata_file.exists() {
        println!("No assets recorded in {}.", dir.display());
        return Ok(());
    }

    let ledger = Ledger::load(&metadata_file)?;
    println!("{} assets in {}:", ledger.len(), dir.display());
    println!("{:<48} {:<24} {}", "TOKEN", "CONTENT-TYPE", "URL");
    for (token, meta) in ledger.iter() {
        println!("{:<48} {:<24} {}", token, meta.content_type, meta.url);
    }
    Ok(())
}
