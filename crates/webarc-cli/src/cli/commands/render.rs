//! `webarc render` – expand an archived template into one offline HTML file.

use anyhow::Result;
use std::path::Path;
use webarc_core::render;
use webarc_core::store::AssetStore;

pub fn run_render(url: &str, out: &Path, dir: &Path) -> Result<()> {
    let store = AssetStore::open(dir)?;
    render::render_to_file(&store, url, out)?;

    println!("Rendered {} -> {}", url, out.display());
    Ok(())
}
