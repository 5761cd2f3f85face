//! The document walk: inline style attributes, asset-bearing attributes,
//! stylesheet elements, and finally script removal.
//!
//! Mutation happens in two phases per stage: collect the target nodes and
//! their current values through selectors, then write replacements back by
//! node id. The resolver sees references in document order.

use anyhow::Result;
use ego_tree::NodeId;
use scraper::Html;

use crate::dom;
use crate::resolve::Resolve;
use crate::template;

/// Every element that can carry an external asset reference.
const ASSET_SELECTOR: &str = "svg image, svg use, source[src], track[src], audio[src], \
     video[src], embed[src], iframe[src], img[src], object[data], \
     link[rel*=\"stylesheet\"][href]";

/// Attribute carrying the reference for a given tag.
fn reference_attr(tag: &str) -> &'static str {
    match tag {
        "image" | "use" => "href",
        "object" => "data",
        "link" => "href",
        _ => "src",
    }
}

/// Rewrite every asset reference in the document to placeholder form.
pub fn rewrite_document(
    html: &mut Html,
    page_url: &str,
    resolver: &mut dyn Resolve,
) -> Result<()> {
    rewrite_inline_styles(html, page_url, resolver)?;
    rewrite_asset_attributes(html, page_url, resolver)?;
    rewrite_style_elements(html, page_url, resolver)?;
    Ok(())
}

/// Drop every `<script>` element. Runs after the ledger is final so a
/// scripted page archives the same as a static one.
pub fn strip_scripts(html: &mut Html) {
    let selector = dom::selector("script");
    let ids: Vec<NodeId> = html.select(&selector).map(|el| el.id()).collect();
    let count = ids.len();
    for id in ids {
        dom::remove_node(html, id);
    }
    if count > 0 {
        tracing::debug!(count, "stripped script elements");
    }
}

fn rewrite_inline_styles(
    html: &mut Html,
    page_url: &str,
    resolver: &mut dyn Resolve,
) -> Result<()> {
    let selector = dom::selector("*[style]");
    let targets: Vec<(NodeId, String)> = html
        .select(&selector)
        .filter_map(|el| el.value().attr("style").map(|css| (el.id(), css.to_string())))
        .collect();

    for (id, declarations) in targets {
        let rewritten = crate::css::rewrite_urls(&declarations, page_url, resolver)?;
        dom::set_attr_by_local(html, id, "style", &rewritten);
    }
    Ok(())
}

fn rewrite_asset_attributes(
    html: &mut Html,
    page_url: &str,
    resolver: &mut dyn Resolve,
) -> Result<()> {
    let selector = dom::selector(ASSET_SELECTOR);
    let targets: Vec<(NodeId, &'static str, String, bool)> = html
        .select(&selector)
        .filter_map(|el| {
            let attr = reference_attr(el.value().name());
            let value = dom::attr_by_local(el.value(), attr)?;
            let is_stylesheet_link = el.value().name() == "link";
            Some((el.id(), attr, value.to_string(), is_stylesheet_link))
        })
        .collect();

    for (id, attr, reference, is_stylesheet_link) in targets {
        let replacement = resolver.resolve(&reference, page_url)?;
        if is_stylesheet_link {
            // The link keeps its href; the bare token goes in a side
            // attribute so a viewer can swap in the archived sheet without
            // the browser ever chasing the original reference.
            match template::unwrap(&replacement) {
                Some(token) => dom::insert_attr(html, id, "data-template-id", token),
                None => dom::set_attr_by_local(html, id, attr, &replacement),
            }
        } else {
            dom::set_attr_by_local(html, id, attr, &replacement);
        }
    }
    Ok(())
}

fn rewrite_style_elements(
    html: &mut Html,
    page_url: &str,
    resolver: &mut dyn Resolve,
) -> Result<()> {
    let selector = dom::selector("style");
    let targets: Vec<(NodeId, String)> = html
        .select(&selector)
        .map(|el| (el.id(), el.text().collect::<String>()))
        .collect();

    for (id, sheet) in targets {
        let rewritten = resolver.resolve_stylesheet(sheet.trim(), page_url)?;
        dom::set_text_content(html, id, &rewritten);
    }
    Ok(())
}
