//! Year-grouped report links.
//!
//! The anchor substructure is `<div id="reports-section">`, holding an
//! interleaved sequence of year headers (`<h2>` containing a 4-digit year)
//! and link lists (`<ul class="report-list">` of `<li><a href>` items).
//!
//! Parsing is a two-pass segmentation rather than a mutable "current year"
//! walk: the container's element children are first grouped into
//! (header, following lists) segments, then the year → links map is built
//! from the segments, skipping the ones whose header has no year. Saving
//! clears the container and re-emits headers and lists for each non-empty
//! year in descending order.

use std::path::Path;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::dom::{Document, Element, NodeId};
use crate::error::{Error, Result};
use crate::loader::DocumentStore;
use crate::serializer::{escape_attr, escape_text};

lazy_static! {
    /// First 4-digit run in a year header.
    static ref YEAR_RE: Regex = Regex::new(r"(\d{4})").unwrap();
}

/// One report link under a year heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLink {
    /// Displayed link text.
    pub text: String,
    /// Basename of the href path.
    pub filename: String,
    /// The href as written.
    pub path: String,
}

impl ReportLink {
    /// Create a link; the filename is derived from the path's basename.
    pub fn new(text: impl Into<String>, path: impl Into<String>) -> Self {
        let path: String = path.into();
        let filename = basename(&path).to_string();
        ReportLink { text: text.into(), filename, path }
    }
}

/// Basename of a POSIX-style href path.
fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The editable year → links archive.
///
/// Years are 4-digit strings; display and save order is descending by year.
#[derive(Debug, Clone, Default)]
pub struct ReportArchive {
    years: IndexMap<String, Vec<ReportLink>>,
    modified: bool,
}

impl ReportArchive {
    /// An empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_years(years: IndexMap<String, Vec<ReportLink>>) -> Self {
        ReportArchive { years, modified: false }
    }

    /// The years present, sorted descending.
    pub fn years_descending(&self) -> Vec<&str> {
        let mut years: Vec<&str> = self.years.keys().map(String::as_str).collect();
        years.sort_by(|a, b| b.cmp(a));
        years
    }

    /// The links under one year.
    pub fn links(&self, year: &str) -> Option<&[ReportLink]> {
        self.years.get(year).map(Vec::as_slice)
    }

    /// Total number of links across all years.
    pub fn len(&self) -> usize {
        self.years.values().map(Vec::len).sum()
    }

    /// Whether the archive holds no links at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a link under a year, creating the year if new.
    pub fn add(&mut self, year: impl Into<String>, link: ReportLink) {
        self.years.entry(year.into()).or_default().push(link);
        self.modified = true;
    }

    /// Remove the link at `index` under `year`; a year emptied by the
    /// removal is dropped entirely.
    pub fn remove(&mut self, year: &str, index: usize) -> Result<ReportLink> {
        let links = self
            .years
            .get_mut(year)
            .ok_or(Error::IndexOutOfRange { index, len: 0 })?;
        if index >= links.len() {
            return Err(Error::IndexOutOfRange { index, len: links.len() });
        }
        let removed = links.remove(index);
        if links.is_empty() {
            self.years.shift_remove(year);
        }
        self.modified = true;
        Ok(removed)
    }

    /// Whether the archive changed since it was parsed or last saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

/// The anchor container.
fn reports_container(doc: &Document, path: &Path) -> Result<NodeId> {
    doc.find_element(doc.root(), |el| el.name == "div" && el.attr("id") == Some("reports-section"))
        .ok_or_else(|| Error::AnchorNotFound {
            anchor: "<div id=\"reports-section\">".to_string(),
            path: path.to_path_buf(),
        })
}

/// One segment of the container: a year header plus its following lists.
struct Segment {
    year: Option<String>,
    lists: Vec<NodeId>,
}

/// Pass one: group the container's element children into segments.
fn segment_children(doc: &Document, container: NodeId) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for child in doc.child_elements(container) {
        let Some(el) = doc.element(child) else { continue };
        if el.name == "h2" {
            let text = doc.text_of(child);
            let year = YEAR_RE.captures(&text).map(|c| c[1].to_string());
            if year.is_none() {
                log::warn!("year header without a 4-digit year: '{}'", text);
            }
            segments.push(Segment { year, lists: Vec::new() });
        } else if el.name == "ul" && el.has_class("report-list") {
            match segments.last_mut() {
                Some(segment) => segment.lists.push(child),
                None => log::warn!("report list before any year header, skipping"),
            }
        }
    }
    segments
}

/// Parse the reports page into a [`ReportArchive`].
///
/// The container's absence is a hard failure. List items without a direct
/// anchor carrying both an href and text are logged and dropped; lists under
/// a yearless header are skipped.
pub fn parse(store: &mut DocumentStore, path: &Path) -> Result<ReportArchive> {
    let doc = store.load(path)?;
    let container = reports_container(doc, path)?;

    // Pass two: build the year map from the segments.
    let mut years: IndexMap<String, Vec<ReportLink>> = IndexMap::new();
    for segment in segment_children(doc, container) {
        let Some(year) = segment.year else { continue };
        let links = years.entry(year).or_default();
        for list in segment.lists {
            for li in doc.child_elements(list).collect::<Vec<_>>() {
                if !doc.is_element_named(li, "li") {
                    continue;
                }
                let anchor = doc.children(li).find(|&c| doc.is_element_named(c, "a"));
                let parsed = anchor.and_then(|a| {
                    let href = doc.attr_of(a, "href")?;
                    let text = doc.text_of(a);
                    if text.is_empty() || href.is_empty() {
                        return None;
                    }
                    Some(ReportLink::new(text, href))
                });
                match parsed {
                    Some(link) => links.push(link),
                    None => log::warn!(
                        "dropping report item without link text and href in '{}'",
                        path.display()
                    ),
                }
            }
        }
    }
    years.retain(|_, links| !links.is_empty());
    Ok(ReportArchive::from_years(years))
}

/// Write a [`ReportArchive`] back into the page and flush the file.
///
/// Destructive rebuild of the container: headers read `Verslagen {year}`,
/// items are sorted by text and link with `target="_blank"`. Saving an empty
/// archive clears the section; confirmation is the caller's concern.
pub fn save(store: &mut DocumentStore, path: &Path, archive: &mut ReportArchive) -> Result<()> {
    let doc = store.load(path)?;
    let container = reports_container(doc, path)?;

    doc.clear_children(container);
    let nl = doc.create_text("\n");
    doc.append_child(container, nl);

    for year in archive.years_descending().iter().map(|y| y.to_string()).collect::<Vec<_>>() {
        let Some(links) = archive.links(&year) else { continue };
        if links.is_empty() {
            continue;
        }
        let mut sorted: Vec<ReportLink> = links.to_vec();
        sorted.sort_by(|a, b| a.text.cmp(&b.text));

        let h2 = doc.create_element(Element::new("h2"));
        let title = doc.create_text(escape_text(&format!("Verslagen {year}")));
        doc.append_child(h2, title);
        doc.append_child(container, h2);
        let nl = doc.create_text("\n");
        doc.append_child(container, nl);

        let mut ul_el = Element::new("ul");
        ul_el.set_attr("class", "report-list");
        let ul = doc.create_element(ul_el);
        let indent = doc.create_text("\n  ");
        doc.append_child(ul, indent);
        for link in &sorted {
            let li = doc.create_element(Element::new("li"));
            let mut a_el = Element::new("a");
            a_el.set_attr("href", escape_attr(&link.path));
            a_el.set_attr("target", "_blank");
            let a = doc.create_element(a_el);
            let text = doc.create_text(escape_text(&link.text));
            doc.append_child(a, text);
            doc.append_child(li, a);
            doc.append_child(ul, li);
            let indent = doc.create_text("\n  ");
            doc.append_child(ul, indent);
        }
        // The trailing item indent becomes the closing newline.
        if let Some(last) = doc.last_child(ul) {
            if doc.text_content(last).is_some_and(|t| t.trim().is_empty()) {
                doc.detach(last);
            }
        }
        let closing = doc.create_text("\n");
        doc.append_child(ul, closing);
        doc.append_child(container, ul);
        let nl = doc.create_text("\n");
        doc.append_child(container, nl);
    }

    store.flush(path)?;
    archive.modified = false;
    Ok(())
}
