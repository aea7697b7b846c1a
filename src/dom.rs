//! Arena-backed HTML document tree.
//!
//! A [`Document`] owns all of its nodes in a `Vec` arena; nodes refer to each
//! other through [`NodeId`] indices (parent, siblings, first/last child).
//! Elements keep their attributes in an insertion-ordered map so untouched
//! markup re-serializes with the original attribute order.
//!
//! # Generation-Counted Handles
//!
//! Long-lived references into the tree (selected text snippets, image tags)
//! are [`NodeHandle`]s: a node id paired with the document's generation at
//! the time the handle was issued. Every structural mutation — detaching a
//! node, clearing children, inserting subtrees — bumps the generation, which
//! invalidates *all* outstanding handles on that document at once. Resolving
//! a stale handle returns [`Error::StaleNode`] instead of silently touching
//! an unrelated node; a rescan issues fresh handles. Replacing the content of
//! a text node is not a structural mutation and does not invalidate handles.

use crate::error::{Error, Result};
use indexmap::IndexMap;

/// Index of a node inside a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A stable external reference to a node: id plus document generation.
///
/// Obtained from [`Document::handle`]; turned back into a usable [`NodeId`]
/// with [`Document::resolve`], which fails if the document changed
/// structurally since the handle was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle {
    id: NodeId,
    generation: u64,
}

/// The payload of a tree node.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The document root; exactly one per tree, never detached.
    Document,
    /// Doctype declaration, raw text between `<!` and `>`.
    Doctype(String),
    /// Comment, raw text between `<!--` and `-->`.
    Comment(String),
    /// Text run, raw as written in the source (entities undecoded).
    Text(String),
    /// An element with a name and attributes.
    Element(Element),
}

impl NodeData {
    /// Human-readable node kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeData::Document => "document",
            NodeData::Doctype(_) => "doctype",
            NodeData::Comment(_) => "comment",
            NodeData::Text(_) => "text",
            NodeData::Element(_) => "element",
        }
    }
}

/// An HTML element: lowercased name, ordered attributes, self-closing flag.
#[derive(Debug, Clone)]
pub struct Element {
    /// Lowercased tag name.
    pub name: String,
    /// Attributes in source order. `None` values are boolean attributes.
    pub attrs: IndexMap<String, Option<String>>,
    /// Whether the source wrote the tag as `<name/>`.
    pub self_closing: bool,
}

impl Element {
    /// Create an element with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Element { name: name.into(), attrs: IndexMap::new(), self_closing: false }
    }

    /// Get an attribute value (raw, entities undecoded).
    ///
    /// Returns `None` both for absent attributes and for boolean ones.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(|v| v.as_deref())
    }

    /// Set an attribute, appending it if new or replacing the value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), Some(value.into()));
    }

    /// Iterate over the whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Whether the `class` attribute contains the given token.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    data: NodeData,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Node {
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            first_child: None,
            last_child: None,
            data,
        }
    }
}

/// An HTML document as an arena of linked nodes.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    generation: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        Document { nodes: vec![Node::new(NodeData::Document)], generation: 0 }
    }

    /// The root node. Always present, never an element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The current structural generation of this document.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Issue a handle for a node at the current generation.
    pub fn handle(&self, id: NodeId) -> NodeHandle {
        NodeHandle { id, generation: self.generation }
    }

    /// Resolve a handle back to a node id.
    ///
    /// Fails with [`Error::StaleNode`] when the document was structurally
    /// mutated after the handle was issued.
    pub fn resolve(&self, handle: NodeHandle) -> Result<NodeId> {
        if handle.generation != self.generation {
            return Err(Error::StaleNode);
        }
        Ok(handle.id)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// The node's payload.
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    /// The node's element data, if it is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id).data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutable element data, if the node is an element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id).data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Whether the node is an element with the given (lowercase) name.
    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.name == name)
    }

    /// The node's parent, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The node's next sibling, if any.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// The node's previous sibling, if any.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// The node's first child, if any.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// The node's last child, if any.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Iterate over the node's direct children in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.node(id).first_child;
        std::iter::successors(first, move |&n| self.node(n).next_sibling)
    }

    /// Iterate over the node's direct element children in order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(|&c| self.element(c).is_some())
    }

    /// Iterate over all descendants of a node in document (pre-) order.
    ///
    /// The node itself is not included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants { doc: self, root: id, next: self.node(id).first_child }
    }

    /// Whether removing this node would take out the document's structure:
    /// the root itself, or an `html`/`head`/`body` element.
    pub fn is_protected(&self, id: NodeId) -> bool {
        if id == self.root() {
            return true;
        }
        self.element(id).is_some_and(|el| matches!(el.name.as_str(), "html" | "head" | "body"))
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeData::Element(element))
    }

    /// Create a detached text node holding raw (already escaped) text.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    /// Create a detached doctype node.
    pub fn create_doctype(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Doctype(text.into()))
    }

    // ------------------------------------------------------------------
    // Structural mutation (bumps the generation)
    // ------------------------------------------------------------------

    fn bump(&mut self) {
        self.generation += 1;
    }

    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(id);
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        if let Some(p) = prev {
            self.node_mut(p).next_sibling = next;
        }
        if let Some(n) = next {
            self.node_mut(n).prev_sibling = prev;
        }
        if let Some(par) = parent {
            if self.node(par).first_child == Some(id) {
                self.node_mut(par).first_child = next;
            }
            if self.node(par).last_child == Some(id) {
                self.node_mut(par).last_child = prev;
            }
        }
        let n = self.node_mut(id);
        n.parent = None;
        n.prev_sibling = None;
        n.next_sibling = None;
    }

    /// Append a node as the last child of a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.unlink(child);
        let last = self.node(parent).last_child;
        match last {
            Some(last) => {
                self.node_mut(last).next_sibling = Some(child);
                self.node_mut(child).prev_sibling = Some(last);
            }
            None => {
                self.node_mut(parent).first_child = Some(child);
            }
        }
        self.node_mut(parent).last_child = Some(child);
        self.node_mut(child).parent = Some(parent);
        self.bump();
    }

    /// Insert a node as the sibling immediately before a reference node.
    ///
    /// The reference node must have a parent.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        self.unlink(new);
        let parent = self.node(reference).parent.expect("reference node has no parent");
        let prev = self.node(reference).prev_sibling;
        match prev {
            Some(prev) => {
                self.node_mut(prev).next_sibling = Some(new);
                self.node_mut(new).prev_sibling = Some(prev);
            }
            None => {
                self.node_mut(parent).first_child = Some(new);
            }
        }
        self.node_mut(new).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new);
        self.node_mut(new).parent = Some(parent);
        self.bump();
    }

    /// Insert a node as the sibling immediately after a reference node.
    ///
    /// The reference node must have a parent.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        self.unlink(new);
        let parent = self.node(reference).parent.expect("reference node has no parent");
        let next = self.node(reference).next_sibling;
        match next {
            Some(next) => {
                self.node_mut(next).prev_sibling = Some(new);
                self.node_mut(new).next_sibling = Some(next);
            }
            None => {
                self.node_mut(parent).last_child = Some(new);
            }
        }
        self.node_mut(new).prev_sibling = Some(reference);
        self.node_mut(reference).next_sibling = Some(new);
        self.node_mut(new).parent = Some(parent);
        self.bump();
    }

    /// Detach a node (and its whole subtree) from its parent.
    ///
    /// The node stays in the arena but is no longer reachable from the root.
    /// Detaching the root is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root() {
            return;
        }
        self.unlink(id);
        self.bump();
    }

    /// Detach all children of a node.
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(child) = self.node(id).first_child {
            self.unlink(child);
        }
        self.bump();
    }

    // ------------------------------------------------------------------
    // Text access
    // ------------------------------------------------------------------

    /// Replace the raw content of a text node.
    ///
    /// Not a structural mutation: outstanding handles stay valid.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
        match &mut self.node_mut(id).data {
            NodeData::Text(t) => {
                *t = text.into();
                Ok(())
            }
            other => Err(Error::Syntax {
                offset: 0,
                reason: format!("expected a text node, found {}", other.type_name()),
            }),
        }
    }

    /// The raw content of a text node, if the node is text.
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Extract the decoded, stripped text of a subtree.
    ///
    /// Each text node is entity-decoded and trimmed; non-empty pieces are
    /// concatenated in document order. Comment and raw-text content inside
    /// `script`/`style` is included only if present as text nodes, which the
    /// parser produces for those elements; callers that care exclude them.
    pub fn text_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut push_text = |raw: &str| {
            let decoded = decode_entities(raw);
            let trimmed = decoded.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
            }
        };
        if let NodeData::Text(t) = &self.node(id).data {
            push_text(t);
        }
        for d in self.descendants(id) {
            if let NodeData::Text(t) = &self.node(d).data {
                push_text(t);
            }
        }
        out
    }

    /// A decoded attribute value of an element node.
    pub fn attr_of(&self, id: NodeId, name: &str) -> Option<String> {
        self.element(id).and_then(|el| el.attr(name)).map(decode_entities)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Find the first descendant element (document order) matching a predicate.
    pub fn find_element(&self, root: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendants(root).find(|&d| self.element(d).is_some_and(&pred))
    }

    /// Find all descendant elements (document order) matching a predicate.
    pub fn find_all_elements(
        &self,
        root: NodeId,
        pred: impl Fn(&Element) -> bool,
    ) -> Vec<NodeId> {
        self.descendants(root).filter(|&d| self.element(d).is_some_and(&pred)).collect()
    }
}

/// Pre-order traversal over the descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        // Advance: first child, else next sibling, else climb until a
        // sibling is found or the traversal root is reached.
        let mut candidate = self.doc.first_child(current);
        if candidate.is_none() {
            let mut at = current;
            while at != self.root {
                if let Some(sib) = self.doc.next_sibling(at) {
                    candidate = Some(sib);
                    break;
                }
                match self.doc.parent(at) {
                    Some(p) if p != self.root => at = p,
                    _ => break,
                }
            }
        }
        self.next = candidate;
        Some(current)
    }
}

/// Decode a small set of character entities for model extraction.
///
/// Handles the named entities that actually occur in the site's markup
/// (`amp`, `lt`, `gt`, `quot`, `apos`, `nbsp`) plus decimal and hexadecimal
/// numeric references. Unknown entities are left as written.
pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        // An entity ends in ';' within a short window; otherwise the '&' is literal.
        let semi = tail[..tail.len().min(32)].find(';');
        match semi {
            Some(semi) => {
                let body = &tail[1..semi];
                let decoded = match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => {
                        if let Some(num) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                            u32::from_str_radix(num, 16).ok().and_then(char::from_u32)
                        } else if let Some(num) = body.strip_prefix('#') {
                            num.parse::<u32>().ok().and_then(char::from_u32)
                        } else {
                            None
                        }
                    }
                };
                match decoded {
                    Some(c) => {
                        out.push(c);
                        rest = &tail[semi + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &tail[1..];
                    }
                }
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
