//! Asset identity: URL digests, placeholder tokens, and asset file names.
//!
//! A canonical URL hashes to `_<sha1 hex>`. The token appends the URL's
//! path extension (`<hash>_<ext>`), so the asset file name can be rebuilt
//! from the token alone by splitting once from the right.

use sha1::{Digest, Sha1};

/// Path extensions (lowercase, no dot) treated as fetchable assets.
/// References to anything else are normalized but left in place.
const ASSET_EXTENSIONS: &[&str] = &[
    "bmp", "css", "doc", "docx", "eot", "gif", "ico", "jpeg", "jpg", "mp3",
    "mp4", "odt", "ogg", "otf", "pdf", "png", "rtf", "svg", "tif", "tiff",
    "ttf", "txt", "wav", "webm", "webp", "woff", "woff2", "xls", "xlsb",
    "xlsx", "xml",
];

/// True if `extension` names a recognized asset format.
pub fn is_asset_extension(extension: &str) -> bool {
    !extension.is_empty() && ASSET_EXTENSIONS.contains(&extension)
}

/// SHA-1 of the URL string, rendered as `_<40 hex chars>`.
///
/// The leading underscore keeps file names from starting with a bare digit
/// and doubles as the marker for archive-managed files.
pub fn url_hash(url: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    format!("_{}", hex::encode(hasher.finalize()))
}

/// Lowercased extension of the URL's path (no dot), or empty when the final
/// path segment has none. Dotfiles and trailing dots count as no extension.
pub fn url_extension(url: &str) -> String {
    let parsed = match url::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return String::new(),
    };
    let name = parsed.path().rsplit('/').next().unwrap_or("");
    match name.rfind('.') {
        Some(i) if i > 0 && i < name.len() - 1 => name[i + 1..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Placeholder token for a canonical URL: `<hash>_<extension>`.
///
/// The extension may be empty, leaving a trailing underscore; the renderer
/// still splits such tokens correctly because the split is right-most.
pub fn token_for_url(url: &str) -> String {
    format!("{}_{}", url_hash(url), url_extension(url))
}

/// File name the asset behind `url` is stored under: `_<hash>.<ext>`,
/// or just `_<hash>` when the URL path has no extension.
pub fn asset_file_name_for_url(url: &str) -> String {
    let hash = url_hash(url);
    let ext = url_extension(url);
    if ext.is_empty() {
        hash
    } else {
        format!("{hash}.{ext}")
    }
}

/// Rebuild the asset file name from a token.
///
/// Splits once from the right on `_`, so the hash stem keeps its interior
/// underscores. Returns `None` for tokens that cannot name a file.
pub fn asset_file_name_for_token(token: &str) -> Option<String> {
    let (stem, ext) = token.rsplit_once('_')?;
    if stem.is_empty() {
        return None;
    }
    if ext.is_empty() {
        Some(stem.to_string())
    } else {
        Some(format!("{stem}.{ext}"))
    }
}
