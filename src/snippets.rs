//! Free-text snippet editing through live node references.
//!
//! Unlike the list-based domains, snippets are edited by direct node
//! mutation: a scan walks every text node of the configured pages and hands
//! out [`TextSnippet`]s whose [`NodeHandle`] points straight into the cached
//! tree. Editing replaces the text node's content verbatim (source-level,
//! entities as written) and flushes the whole document; deleting removes the
//! snippet's *entire parent element*, subtree included.
//!
//! Any structural edit bumps the owning document's generation, so every
//! other snippet (and image reference) handle into that document fails fast
//! with a stale-node error afterwards — a rescan is the way back to a
//! consistent list.

use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::dom::{Element, NodeData, NodeHandle};
use crate::error::{Error, Result};
use crate::loader::DocumentStore;
use crate::serializer::escape_text;

/// Maximum length of the flattened display string, in characters.
const DISPLAY_TRUNCATE_AT: usize = 100;

/// Where to place a newly inserted element relative to the reference
/// snippet's parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Immediately before the parent element.
    Before,
    /// Immediately after the parent element.
    After,
}

/// One editable text snippet found by a scan.
#[derive(Debug, Clone)]
pub struct TextSnippet {
    /// Sequential id, unique within one scan (continues across files).
    pub id: usize,
    /// The HTML file the snippet lives in.
    pub file: PathBuf,
    /// The raw text as written in the source, whitespace preserved.
    pub original_text: String,
    /// Flattened, truncated text for listings.
    pub display_text: String,
    /// Live reference to the text node in the cached tree.
    pub handle: NodeHandle,
}

/// Flatten raw text for display: truncate at 100 characters, newlines
/// become spaces, carriage returns are dropped.
fn display_text(raw: &str) -> String {
    let mut display: String = raw.chars().take(DISPLAY_TRUNCATE_AT).collect();
    if raw.chars().count() > DISPLAY_TRUNCATE_AT {
        display.push_str("...");
    }
    display.replace('\n', " ").replace('\r', "")
}

/// Scan files for editable text snippets.
///
/// Walks every text node in document order, skipping nodes whose parent is
/// an excluded tag (`script`, `style`) and nodes that are whitespace-only.
/// Comments are separate node kinds and never show up. Files that fail to
/// parse are logged and skipped; the scan continues with the rest.
pub fn scan(store: &mut DocumentStore, files: &[PathBuf]) -> Vec<TextSnippet> {
    let mut snippets = Vec::new();
    for file in files {
        let doc = match store.load(file) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("skipping '{}' in text scan: {}", file.display(), e);
                continue;
            }
        };
        let root = doc.root();
        for node in doc.descendants(root) {
            let NodeData::Text(raw) = doc.data(node) else { continue };
            if raw.trim().is_empty() {
                continue;
            }
            let parent_excluded = doc
                .parent(node)
                .and_then(|p| doc.element(p))
                .is_some_and(|el| SiteConfig::is_excluded_text_tag(&el.name));
            if parent_excluded {
                continue;
            }
            snippets.push(TextSnippet {
                id: snippets.len(),
                file: file.clone(),
                original_text: raw.clone(),
                display_text: display_text(raw),
                handle: doc.handle(node),
            });
        }
    }
    snippets
}

/// Replace a snippet's text verbatim and flush its document.
///
/// On success the snippet's stored text and display string are refreshed.
/// Text replacement is not structural, so other handles into the document
/// stay valid.
pub fn edit(store: &mut DocumentStore, snippet: &mut TextSnippet, new_text: &str) -> Result<()> {
    let doc = store.get_mut(&snippet.file)?;
    let node = doc.resolve(snippet.handle)?;
    doc.set_text(node, new_text)?;
    store.flush(&snippet.file)?;
    snippet.original_text = new_text.to_string();
    snippet.display_text = display_text(new_text);
    Ok(())
}

/// Delete the snippet's whole parent element (subtree included) and flush.
///
/// Refused when the parent is the document root or an `html`/`head`/`body`
/// element. Returns the removed tag's name. This invalidates every other
/// handle into the document; a rescan is strongly recommended.
pub fn delete_parent(store: &mut DocumentStore, snippet: &TextSnippet) -> Result<String> {
    let doc = store.get_mut(&snippet.file)?;
    let node = doc.resolve(snippet.handle)?;
    let parent = doc
        .parent(node)
        .ok_or_else(|| Error::ProtectedElement("#document".to_string()))?;
    if doc.is_protected(parent) {
        let name = doc
            .element(parent)
            .map(|el| el.name.clone())
            .unwrap_or_else(|| "#document".to_string());
        return Err(Error::ProtectedElement(name));
    }
    let name = match doc.element(parent) {
        Some(el) => el.name.clone(),
        // A text node directly under a non-element (comment/doctype cannot
        // have children, so this does not occur in built trees).
        None => return Err(Error::ProtectedElement("#document".to_string())),
    };
    doc.detach(parent);
    store.flush(&snippet.file)?;
    log::info!("removed <{}> from '{}'", name, snippet.file.display());
    Ok(name)
}

/// Insert a new element adjacent to the snippet's parent element and flush.
///
/// The tag must come from the fixed allow-list (`p`, `h1`-`h6`, `div`,
/// `blockquote`). The element is wrapped in literal newline text nodes for
/// formatting. This is structural: every outstanding handle into the
/// document goes stale; rescan afterwards.
pub fn insert_adjacent(
    store: &mut DocumentStore,
    snippet: &TextSnippet,
    tag: &str,
    text: &str,
    position: InsertPosition,
) -> Result<()> {
    if !SiteConfig::is_allowed_insert_tag(tag) {
        return Err(Error::TagNotAllowed(tag.to_string()));
    }
    let doc = store.get_mut(&snippet.file)?;
    let node = doc.resolve(snippet.handle)?;
    let parent = doc
        .parent(node)
        .filter(|&p| p != doc.root())
        .ok_or_else(|| Error::ProtectedElement("#document".to_string()))?;

    let element = doc.create_element(Element::new(tag));
    let content = doc.create_text(escape_text(text));
    doc.append_child(element, content);
    let leading = doc.create_text("\n");
    let trailing = doc.create_text("\n");

    match position {
        InsertPosition::Before => {
            doc.insert_before(parent, leading);
            doc.insert_before(parent, element);
            doc.insert_before(parent, trailing);
        }
        InsertPosition::After => {
            doc.insert_after(parent, trailing);
            doc.insert_after(parent, element);
            doc.insert_after(parent, leading);
        }
    }
    store.flush(&snippet.file)?;
    Ok(())
}
