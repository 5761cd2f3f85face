//! Helpers over the scraper DOM: selector parsing, attribute access by
//! local name, and the node surgery the document walk needs.
//!
//! Attribute lookups go by local name so namespaced spellings such as
//! `xlink:href` on SVG content are found without guessing the namespace.

pub mod serialize;

use ego_tree::NodeId;
use html5ever::{LocalName, Namespace, QualName};
use scraper::node::{Element, Node, Text};
use scraper::{Html, Selector};

/// Parse a selector that is a compile-time literal.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Attribute value matched by local name, namespaced or not.
pub fn attr_by_local<'a>(element: &'a Element, local: &str) -> Option<&'a str> {
    element
        .attrs
        .iter()
        .find(|(name, _)| name.local.as_ref() == local)
        .map(|(_, value)| &**value)
}

/// Overwrite the attribute matched by local name on the element `id`.
/// Does nothing when the element or the attribute is gone.
pub fn set_attr_by_local(html: &mut Html, id: NodeId, local: &str, value: &str) {
    if let Some(mut node) = html.tree.get_mut(id) {
        if let Node::Element(element) = node.value() {
            let slot = element
                .attrs
                .iter_mut()
                .find(|(name, _)| name.local.as_ref() == local)
                .map(|(_, value)| value);
            if let Some(slot) = slot {
                *slot = value.into();
            }
        }
    }
}

/// Set (inserting if needed) an un-namespaced attribute on the element `id`.
pub fn insert_attr(html: &mut Html, id: NodeId, name: &str, value: &str) {
    if let Some(mut node) = html.tree.get_mut(id) {
        if let Node::Element(element) = node.value() {
            let qual = QualName::new(None, Namespace::from(""), LocalName::from(name));
            element.attrs.insert(qual, value.into());
        }
    }
}

/// Replace the children of the element `id` with a single text node.
pub fn set_text_content(html: &mut Html, id: NodeId, text: &str) {
    if let Some(mut node) = html.tree.get_mut(id) {
        while let Some(mut child) = node.first_child() {
            child.detach();
        }
        node.append(Node::Text(Text { text: text.into() }));
    }
}

/// Detach the node `id`; it no longer serializes.
pub fn remove_node(html: &mut Html, id: NodeId) {
    if let Some(mut node) = html.tree.get_mut(id) {
        node.detach();
    }
}
