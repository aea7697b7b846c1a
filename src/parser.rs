//! HTML tree builder.
//!
//! Combines tokens from the [`lexer`](crate::lexer) into a [`Document`] tree.
//! The builder keeps a stack of open elements and supports two modes, chosen
//! through [`ParserOptions`]:
//!
//! - **Strict**: any malformed markup (mismatched end tags, stray end tags,
//!   a bogus `<`, unclosed elements at end of input) is rejected with a
//!   [`Error::Syntax`] carrying the byte offset.
//! - **Lenient**: recovers the way a permissive HTML parser does — elements
//!   are closed implicitly, stray end tags are ignored, and a `<` that opens
//!   no markup becomes literal text.
//!
//! Void elements (`br`, `img`, ...) never open a stack entry; raw-text
//! elements (`script`, `style`) swallow their content verbatim up to the
//! matching end tag. A nesting-depth limit guards against pathological input
//! in both modes.

use crate::dom::{Document, Element, NodeData, NodeId};
use crate::error::{Error, Result};
use crate::lexer::{self, Token};
use indexmap::IndexMap;

/// Elements that never have content and take no end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text up to the matching end tag.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Options controlling error handling during tree construction.
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Fail on the first markup error (true) or recover (false).
    pub strict: bool,

    /// Maximum depth of the open-element stack.
    ///
    /// Prevents stack-shaped resource exhaustion from pathologically nested
    /// input. Exceeding it is an error in both modes.
    pub max_depth: usize,
}

impl Default for ParserOptions {
    /// Default configuration: lenient, matching how the site's documents
    /// are loaded in practice.
    fn default() -> Self {
        Self::lenient()
    }
}

impl ParserOptions {
    /// Strict mode: reject malformed markup with byte offsets.
    pub fn strict() -> Self {
        ParserOptions { strict: true, max_depth: 100 }
    }

    /// Lenient mode: recover from malformed markup.
    pub fn lenient() -> Self {
        ParserOptions { strict: false, max_depth: 100 }
    }
}

/// Whether a tag name is a void element.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Whether a tag name is a raw-text element.
pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

/// Parse HTML source text into a document tree.
pub fn parse_document(input: &str, options: ParserOptions) -> Result<Document> {
    TreeBuilder::new(input, options).build()
}

struct TreeBuilder<'a> {
    input: &'a str,
    rest: &'a str,
    options: ParserOptions,
    doc: Document,
    /// Open elements: (node, name). The root sentinel is not on the stack.
    stack: Vec<(NodeId, String)>,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a str, options: ParserOptions) -> Self {
        TreeBuilder { input, rest: input, options, doc: Document::new(), stack: Vec::new() }
    }

    fn offset(&self) -> usize {
        self.input.len() - self.rest.len()
    }

    fn current_parent(&self) -> NodeId {
        self.stack.last().map(|(id, _)| *id).unwrap_or_else(|| self.doc.root())
    }

    fn append_text(&mut self, text: &str) {
        let parent = self.current_parent();
        // Merge with a trailing text node so lenient `<` recovery does not
        // fragment a run into single characters.
        if let Some(last) = self.doc.last_child(parent) {
            if let NodeData::Text(existing) = self.doc.data(last) {
                let merged = format!("{existing}{text}");
                let _ = self.doc.set_text(last, merged);
                return;
            }
        }
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node);
    }

    fn build(mut self) -> Result<Document> {
        while !self.rest.is_empty() {
            match lexer::token(self.rest) {
                Ok((next, tok)) => {
                    self.rest = next;
                    match tok {
                        Token::Text(t) => self.append_text(t),
                        Token::Comment(c) => {
                            let parent = self.current_parent();
                            let node = self.doc.create_comment(c);
                            self.doc.append_child(parent, node);
                        }
                        Token::Doctype(d) => {
                            let parent = self.current_parent();
                            let node = self.doc.create_doctype(d);
                            self.doc.append_child(parent, node);
                        }
                        Token::StartTag { name, attrs, self_closing } => {
                            self.handle_start_tag(name, attrs, self_closing)?;
                        }
                        Token::EndTag(name) => self.handle_end_tag(&name)?,
                    }
                }
                Err(_) => {
                    if self.options.strict {
                        return Err(Error::Syntax {
                            offset: self.offset(),
                            reason: "'<' does not open valid markup".to_string(),
                        });
                    }
                    // Lenient: the '<' is literal text.
                    let ch_len = self.rest.chars().next().map_or(1, char::len_utf8);
                    let (ch, next) = self.rest.split_at(ch_len);
                    self.append_text(ch);
                    self.rest = next;
                }
            }
        }

        if let Some((_, name)) = self.stack.last() {
            if self.options.strict {
                return Err(Error::Syntax {
                    offset: self.offset(),
                    reason: format!("unclosed element <{name}> at end of input"),
                });
            }
            log::debug!("implicitly closing {} open element(s) at end of input", self.stack.len());
        }
        Ok(self.doc)
    }

    fn handle_start_tag(
        &mut self,
        name: String,
        attrs: Vec<(String, Option<String>)>,
        self_closing: bool,
    ) -> Result<()> {
        // First occurrence of a duplicated attribute wins.
        let mut map: IndexMap<String, Option<String>> = IndexMap::with_capacity(attrs.len());
        for (k, v) in attrs {
            map.entry(k).or_insert(v);
        }
        let element = Element { name: name.clone(), attrs: map, self_closing };
        let id = self.doc.create_element(element);
        let parent = self.current_parent();
        self.doc.append_child(parent, id);

        if is_raw_text_element(&name) && !self_closing {
            return self.consume_raw_text(id, &name);
        }
        if !is_void_element(&name) && !self_closing {
            if self.stack.len() >= self.options.max_depth {
                return Err(Error::DepthLimitExceeded(self.options.max_depth));
            }
            self.stack.push((id, name));
        }
        Ok(())
    }

    /// Swallow a raw-text element's content and its end tag.
    fn consume_raw_text(&mut self, id: NodeId, name: &str) -> Result<()> {
        let (content, after) = lexer::raw_text(self.rest, name);
        if !content.is_empty() {
            let node = self.doc.create_text(content);
            self.doc.append_child(id, node);
        }
        self.rest = after;
        match lexer::token(self.rest) {
            Ok((next, Token::EndTag(end))) if end == name => {
                self.rest = next;
                Ok(())
            }
            _ => {
                if self.options.strict {
                    return Err(Error::Syntax {
                        offset: self.offset(),
                        reason: format!("unclosed <{name}> raw-text element"),
                    });
                }
                log::debug!("implicitly closing raw-text element <{name}>");
                Ok(())
            }
        }
    }

    fn handle_end_tag(&mut self, name: &str) -> Result<()> {
        if self.stack.last().is_some_and(|(_, open)| open == name) {
            self.stack.pop();
            return Ok(());
        }
        match self.stack.iter().rposition(|(_, open)| open == name) {
            Some(pos) => {
                if self.options.strict {
                    let open = &self.stack.last().map(|(_, n)| n.clone()).unwrap_or_default();
                    return Err(Error::Syntax {
                        offset: self.offset(),
                        reason: format!("mismatched end tag </{name}> while <{open}> is open"),
                    });
                }
                log::debug!(
                    "implicitly closing {} element(s) for </{}>",
                    self.stack.len() - pos,
                    name
                );
                self.stack.truncate(pos);
            }
            None => {
                if self.options.strict {
                    return Err(Error::Syntax {
                        offset: self.offset(),
                        reason: format!("stray end tag </{name}>"),
                    });
                }
                log::debug!("ignoring stray end tag </{}>", name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeData;

    fn first_named(doc: &Document, name: &str) -> Option<NodeId> {
        doc.find_element(doc.root(), |el| el.name == name)
    }

    // ========================================================================
    // Well-Formed Input Tests
    // ========================================================================

    #[test]
    fn test_parse_nested_elements() {
        let doc = parse_document("<div><p>hello</p></div>", ParserOptions::strict()).unwrap();
        let p = first_named(&doc, "p").unwrap();
        assert_eq!(doc.text_of(p), "hello");
        let div = first_named(&doc, "div").unwrap();
        assert_eq!(doc.parent(p), Some(div));
    }

    #[test]
    fn test_parse_doctype_and_comment() {
        let doc =
            parse_document("<!DOCTYPE html><!-- note --><p>x</p>", ParserOptions::strict()).unwrap();
        let kinds: Vec<_> =
            doc.children(doc.root()).map(|c| doc.data(c).type_name()).collect();
        assert_eq!(kinds, vec!["doctype", "comment", "element"]);
    }

    #[test]
    fn test_void_element_does_not_nest() {
        let doc = parse_document("<p>a<br>b</p>", ParserOptions::strict()).unwrap();
        let p = first_named(&doc, "p").unwrap();
        let kinds: Vec<_> = doc.children(p).map(|c| doc.data(c).type_name()).collect();
        assert_eq!(kinds, vec!["text", "element", "text"]);
    }

    #[test]
    fn test_self_closing_tag_does_not_nest() {
        let doc = parse_document("<div><span/>after</div>", ParserOptions::strict()).unwrap();
        let span = first_named(&doc, "span").unwrap();
        assert!(doc.first_child(span).is_none());
        let div = first_named(&doc, "div").unwrap();
        assert_eq!(doc.text_of(div), "after");
    }

    #[test]
    fn test_raw_text_element_keeps_markup_verbatim() {
        let doc = parse_document(
            "<script>if (a < b) { x('<p>'); }</script>",
            ParserOptions::strict(),
        )
        .unwrap();
        let script = first_named(&doc, "script").unwrap();
        let text = doc.first_child(script).unwrap();
        assert_eq!(doc.text_content(text), Some("if (a < b) { x('<p>'); }"));
    }

    #[test]
    fn test_duplicate_attribute_first_wins() {
        let doc =
            parse_document(r#"<p class="a" class="b">x</p>"#, ParserOptions::strict()).unwrap();
        let p = first_named(&doc, "p").unwrap();
        assert_eq!(doc.element(p).unwrap().attr("class"), Some("a"));
    }

    // ========================================================================
    // Strict Mode Tests
    // ========================================================================

    #[test]
    fn test_strict_rejects_mismatched_end_tag() {
        let err = parse_document("<div><p>x</div>", ParserOptions::strict()).unwrap_err();
        match err {
            Error::Syntax { reason, .. } => assert!(reason.contains("</div>")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_strict_rejects_stray_end_tag() {
        assert!(parse_document("a</p>", ParserOptions::strict()).is_err());
    }

    #[test]
    fn test_strict_rejects_unclosed_element() {
        assert!(parse_document("<div>open", ParserOptions::strict()).is_err());
    }

    #[test]
    fn test_strict_rejects_bogus_angle_bracket_with_offset() {
        let err = parse_document("abc< def", ParserOptions::strict()).unwrap_err();
        match err {
            Error::Syntax { offset, .. } => assert_eq!(offset, 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    // ========================================================================
    // Lenient Mode Tests
    // ========================================================================

    #[test]
    fn test_lenient_implicitly_closes() {
        let doc = parse_document("<div><p>x</div>done", ParserOptions::lenient()).unwrap();
        let p = first_named(&doc, "p").unwrap();
        assert_eq!(doc.text_of(p), "x");
        // "done" lands outside the div, not inside the p.
        let root_text = doc
            .children(doc.root())
            .filter_map(|c| doc.text_content(c).map(str::to_string))
            .collect::<String>();
        assert_eq!(root_text, "done");
    }

    #[test]
    fn test_lenient_ignores_stray_end_tag() {
        let doc = parse_document("a</p>b", ParserOptions::lenient()).unwrap();
        assert_eq!(doc.text_of(doc.root()), "ab");
    }

    #[test]
    fn test_lenient_treats_bogus_angle_bracket_as_text() {
        let doc = parse_document("<p>a < b</p>", ParserOptions::lenient()).unwrap();
        let p = first_named(&doc, "p").unwrap();
        assert_eq!(doc.text_of(p), "a < b");
    }

    #[test]
    fn test_lenient_closes_open_elements_at_eof() {
        let doc = parse_document("<div><p>tail", ParserOptions::lenient()).unwrap();
        let p = first_named(&doc, "p").unwrap();
        assert_eq!(doc.text_of(p), "tail");
    }

    // ========================================================================
    // Depth Limit Tests
    // ========================================================================

    #[test]
    fn test_depth_limit_enforced() {
        let deep = "<div>".repeat(200);
        let err = parse_document(&deep, ParserOptions::lenient()).unwrap_err();
        assert!(matches!(err, Error::DepthLimitExceeded(100)));
    }
}
