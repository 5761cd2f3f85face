//! Document serialization for template output.
//!
//! Walks the tree directly instead of going through a serializer trait:
//! attributes come out in sorted name order so archive reruns produce
//! byte-identical templates, raw-text elements keep their content
//! unescaped, and void elements close per HTML syntax.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

/// Elements with no closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children serialize without entity escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize the whole document, doctype included.
pub fn to_html(html: &Html) -> String {
    let mut out = String::new();
    for child in html.tree.root().children() {
        serialize_node(child, &mut out, false);
    }
    out
}

fn serialize_node(node: NodeRef<'_, Node>, out: &mut String, raw_text: bool) {
    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                serialize_node(child, out, raw_text);
            }
        }
        Node::Doctype(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype.name());
            out.push('>');
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Text(text) => {
            if raw_text {
                out.push_str(&text.text);
            } else {
                push_escaped_text(out, &text.text);
            }
        }
        Node::Element(element) => {
            let name = qualified_name(&element.name);
            out.push('<');
            out.push_str(&name);

            let mut attrs: Vec<(String, &str)> = element
                .attrs
                .iter()
                .map(|(qual, value)| (qualified_name(qual), &**value))
                .collect();
            attrs.sort_by(|a, b| a.0.cmp(&b.0));
            for (attr_name, value) in attrs {
                out.push(' ');
                out.push_str(&attr_name);
                out.push_str("=\"");
                push_escaped_attr(out, value);
                out.push('"');
            }
            out.push('>');

            let local = element.name.local.as_ref();
            if VOID_ELEMENTS.contains(&local) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&local);
            for child in node.children() {
                serialize_node(child, out, raw);
            }
            out.push_str("</");
            out.push_str(&name);
            out.push('>');
        }
        Node::ProcessingInstruction(_) => {}
    }
}

/// `prefix:local` when the name carries a prefix, else just the local name.
fn qualified_name(name: &html5ever::QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix.as_ref(), name.local.as_ref()),
        None => name.local.as_ref().to_string(),
    }
}

fn push_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn push_escaped_attr(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
}
