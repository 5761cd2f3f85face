//! Integration test: archive a page from a local HTTP server, then render it
//! into a single offline file.
//!
//! Starts a fixture server with a page, stylesheets, images and a script,
//! archives the page over real HTTP, and asserts the snapshot, template,
//! asset store, metadata and rendered output all line up.

mod common;

use common::asset_server;
use std::fs;
use tempfile::tempdir;
use webarc_core::archive::Archiver;
use webarc_core::fetch::FetchOptions;
use webarc_core::ledger::Ledger;
use webarc_core::token;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\ntest-image-payload";
const PNG_B64: &str = "iVBORw0KGgp0ZXN0LWltYWdlLXBheWxvYWQ=";

const PAGE_HTML: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Fixture</title>
<link rel="stylesheet" href="/css/style.css">
<script src="/app.js"></script>
<style>
@import url(/css/extra.css);
</style>
</head>
<body>
<div style="background: url('/img/logo.png')">hero</div>
<img src="/img/logo.png">
<img src="img/logo.png">
<object data="/css/style.css"></object>
<a href="#top">up</a>
<script>window.tracker = 1;</script>
</body>
</html>
"##;

const STYLE_CSS: &str =
    "@import url(other.css);\nbody { background-image: url(\"/img/bg.png\"); }\n";
const OTHER_CSS: &str = "h1 { color: #333; }\n";
const EXTRA_CSS: &str = "p { margin: 0; }\n";

fn fixture_server() -> asset_server::AssetServer {
    asset_server::start(&[
        ("/page.html", "text/html; charset=utf-8", PAGE_HTML.as_bytes()),
        ("/css/style.css", "text/css", STYLE_CSS.as_bytes()),
        ("/css/other.css", "text/css", OTHER_CSS.as_bytes()),
        ("/css/extra.css", "text/css", EXTRA_CSS.as_bytes()),
        ("/img/logo.png", "image/png", PNG_BYTES),
        ("/img/bg.png", "image/png", PNG_BYTES),
        ("/app.js", "text/javascript", b"window.tracker = 1;\n"),
    ])
}

#[test]
fn archive_then_render_produces_offline_page() {
    let server = fixture_server();
    let page_url = server.url("/page.html");
    let dir = tempdir().unwrap();

    let archiver = Archiver::open(dir.path(), FetchOptions::default()).unwrap();
    let summary = archiver.archive_url(&page_url).unwrap();

    // Page snapshot is byte-for-byte what the server sent.
    let raw = fs::read_to_string(&summary.raw_file).unwrap();
    assert_eq!(raw, PAGE_HTML);

    // style.css (via link and object), logo.png and bg.png are recorded;
    // @import targets are inlined into their parent sheet, not stored.
    assert_eq!(summary.assets_recorded, 3);
    let ledger = Ledger::load(&archiver.store().metadata_file()).unwrap();
    assert_eq!(ledger.len(), 3);

    let style_token = token::token_for_url(&server.url("/css/style.css"));
    let logo_token = token::token_for_url(&server.url("/img/logo.png"));
    let bg_token = token::token_for_url(&server.url("/img/bg.png"));
    assert_eq!(ledger.get(&style_token).unwrap().content_type, "text/css");
    assert_eq!(ledger.get(&logo_token).unwrap().content_type, "image/png");
    assert_eq!(ledger.get(&bg_token).unwrap().url, server.url("/img/bg.png"));

    // Every asset was fetched exactly once despite repeated references.
    assert_eq!(server.hits("/page.html"), 1);
    assert_eq!(server.hits("/css/style.css"), 1);
    assert_eq!(server.hits("/css/other.css"), 1);
    assert_eq!(server.hits("/css/extra.css"), 1);
    assert_eq!(server.hits("/img/logo.png"), 1);
    assert_eq!(server.hits("/img/bg.png"), 1);
    // Scripts are stripped, never fetched.
    assert_eq!(server.hits("/app.js"), 0);

    // Stored stylesheet: import flattened in place, references tokenized.
    let style_asset = fs::read_to_string(
        archiver
            .store()
            .asset_path_for_url(&server.url("/css/style.css")),
    )
    .unwrap();
    assert_eq!(
        style_asset,
        format!(
            "h1 {{ color: #333; }}\n\nbody {{ background-image: url(\"$$${{{bg_token}}}\"); }}\n"
        )
    );
    let logo_asset = fs::read(
        archiver
            .store()
            .asset_path_for_url(&server.url("/img/logo.png")),
    )
    .unwrap();
    assert_eq!(logo_asset, PNG_BYTES);

    // Template: placeholders in asset positions, stylesheet link kept
    // navigable, scripts gone.
    let template = fs::read_to_string(&summary.template_file).unwrap();
    assert!(template.contains(&format!(r#"data-template-id="{style_token}""#)));
    assert!(template.contains(r#"href="/css/style.css""#));
    assert!(template.contains(&format!(r#"data="$$${{{style_token}}}""#)));
    assert_eq!(
        template
            .matches(&format!(r#"src="$$${{{logo_token}}}""#))
            .count(),
        2
    );
    assert!(template.contains(&format!("url(&quot;$$${{{logo_token}}}&quot;)")));
    assert!(template.contains("p { margin: 0; }"));
    assert!(!template.contains("@import"));
    assert!(!template.contains("<script"));
    assert!(template.contains(r##"href="#top""##));

    // Render: every placeholder becomes a data URI.
    let out = dir.path().join("offline.html");
    archiver.render_url(&page_url, &out).unwrap();
    let rendered = fs::read_to_string(&out).unwrap();
    assert!(!rendered.contains("$$${"));
    assert!(rendered.contains(&format!("data:image/png;base64,{PNG_B64}")));
    assert!(rendered.contains("data:text/css;charset=UTF-8,"));
    // The stylesheet data URI carries the image as a nested, percent-encoded
    // data URI.
    assert!(rendered.contains("data%3Aimage/png%3Bbase64%2C"));
    // The bare token on the link survives as archive bookkeeping.
    assert!(rendered.contains(&format!(r#"data-template-id="{style_token}""#)));
}

#[test]
fn second_page_reuses_assets_in_shared_archive() {
    let page_a = r#"<html><body><img src="/img/logo.png"></body></html>"#;
    let page_b = concat!(
        r#"<html><body><img src="/img/logo.png"><img src="/img/bg.png">"#,
        r#"<iframe src="/frame.html"></iframe></body></html>"#,
    );
    let server = asset_server::start(&[
        ("/a.html", "text/html", page_a.as_bytes()),
        ("/b.html", "text/html", page_b.as_bytes()),
        ("/img/logo.png", "image/png", PNG_BYTES),
        ("/img/bg.png", "image/png", PNG_BYTES),
        ("/frame.html", "text/html", b"<html></html>"),
    ]);
    let dir = tempdir().unwrap();
    let archiver = Archiver::open(dir.path(), FetchOptions::default()).unwrap();

    let summary_a = archiver.archive_url(&server.url("/a.html")).unwrap();
    assert_eq!(summary_a.assets_recorded, 1);

    let summary_b = archiver.archive_url(&server.url("/b.html")).unwrap();
    assert_eq!(summary_b.assets_recorded, 1, "only bg.png is new");

    let ledger = Ledger::load(&archiver.store().metadata_file()).unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(server.hits("/img/logo.png"), 1, "logo fetched once across pages");
    assert_eq!(server.hits("/img/bg.png"), 1);

    // Non-asset extensions are absolutized, not archived.
    let template_b = fs::read_to_string(&summary_b.template_file).unwrap();
    assert!(template_b.contains(&format!(r#"src="{}""#, server.url("/frame.html"))));
    assert_eq!(server.hits("/frame.html"), 0);

    // Each page keeps its own snapshot and template.
    assert_ne!(summary_a.raw_file, summary_b.raw_file);
    assert!(summary_a.template_file.exists());
    assert!(summary_b.template_file.exists());
}

#[test]
fn archive_fails_on_missing_asset() {
    let page = r#"<html><body><img src="/missing.png"></body></html>"#;
    let server = asset_server::start(&[("/page.html", "text/html", page.as_bytes())]);
    let dir = tempdir().unwrap();
    let archiver = Archiver::open(dir.path(), FetchOptions::default()).unwrap();

    let err = archiver.archive_url(&server.url("/page.html")).unwrap_err();
    assert!(format!("{err:#}").contains("404"), "got: {err:#}");

    // The raw snapshot lands before resolution; nothing else does.
    assert!(archiver.store().raw_html_file(&server.url("/page.html")).exists());
    assert!(!archiver
        .store()
        .template_html_file(&server.url("/page.html"))
        .exists());
    assert!(!archiver.store().metadata_file().exists());
}

#[test]
fn render_fails_when_stored_asset_is_deleted() {
    let page = r#"<html><body><img src="/img/logo.png"></body></html>"#;
    let server = asset_server::start(&[
        ("/page.html", "text/html", page.as_bytes()),
        ("/img/logo.png", "image/png", PNG_BYTES),
    ]);
    let dir = tempdir().unwrap();
    let archiver = Archiver::open(dir.path(), FetchOptions::default()).unwrap();
    let page_url = server.url("/page.html");
    archiver.archive_url(&page_url).unwrap();

    let logo_path = archiver
        .store()
        .asset_path_for_url(&server.url("/img/logo.png"));
    fs::remove_file(&logo_path).unwrap();

    let err = archiver
        .render_url(&page_url, &dir.path().join("out.html"))
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("read asset"), "got: {msg}");
}
