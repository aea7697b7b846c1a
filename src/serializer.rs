//! Document serialization.
//!
//! Emits a [`Document`] tree back to HTML text. The emission is verbatim
//! from the stored tree: text nodes are written exactly as stored (entities
//! stay as written), attributes keep their source order, and self-closing
//! flags are preserved, so a parse → serialize cycle of an untouched
//! document is stable. Rebuilt regions carry whatever newline/indent text
//! nodes their builders inserted; there is no reformatting pass.
//!
//! The escaping helpers are for *newly created* content only: model data
//! being placed into fresh text nodes or attribute values must be escaped
//! before it enters the tree, since text nodes store raw markup text.

use crate::dom::{Document, Element, NodeData, NodeId};
use crate::parser::is_void_element;

/// Serialize a whole document to HTML text.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    for child in doc.children(doc.root()) {
        serialize_node(doc, child, &mut out);
    }
    out
}

/// Serialize one node (and its subtree) into the output buffer.
pub fn serialize_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Document => {
            for child in doc.children(id) {
                serialize_node(doc, child, out);
            }
        }
        NodeData::Doctype(d) => {
            out.push_str("<!");
            out.push_str(d);
            out.push('>');
        }
        NodeData::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c);
            out.push_str("-->");
        }
        NodeData::Text(t) => out.push_str(t),
        NodeData::Element(el) => serialize_element(doc, id, el, out),
    }
}

fn serialize_element(doc: &Document, id: NodeId, el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        if let Some(value) = value {
            // Values from single-quoted source may contain a double quote.
            if value.contains('"') {
                out.push_str("='");
                out.push_str(value);
                out.push('\'');
            } else {
                out.push_str("=\"");
                out.push_str(value);
                out.push('"');
            }
        }
    }

    let has_children = doc.first_child(id).is_some();
    if el.self_closing && !has_children {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if is_void_element(&el.name) && !has_children {
        return;
    }
    for child in doc.children(id) {
        serialize_node(doc, child, out);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

/// Escape model text for storage in a text node.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape model text for storage in a (double-quoted) attribute value.
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
