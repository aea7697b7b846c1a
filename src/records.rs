//! Club records: a 5-column table per records page.
//!
//! The anchor substructure is `<table class="records-table">` and its
//! `<tbody>`; when the tagged table is missing, the first `<tbody>` anywhere
//! in the document is used instead (a deliberately loose fallback the site's
//! older pages rely on). Each body row with exactly five cells becomes a
//! [`RecordRow`]; rows of any other shape are logged and dropped. Saving is
//! a destructive rebuild: the body is cleared and regenerated from the
//! in-memory list, newline/indent text nodes included, then the whole
//! document is flushed.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::dom::{Document, Element, NodeId};
use crate::error::{Error, Result};
use crate::loader::DocumentStore;
use crate::serializer::escape_text;

/// Number of columns in a records table row.
pub const RECORD_FIELDS: usize = 5;

/// One record: an ordered tuple of five text fields.
///
/// Identity is position in the [`RecordSet`]; there is no natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    /// The event, e.g. "100m".
    pub discipline: String,
    /// Athlete name.
    pub name: String,
    /// The performance, e.g. "10.95".
    pub performance: String,
    /// Where the record was set.
    pub place: String,
    /// When the record was set (free text on these pages).
    pub date: String,
}

impl RecordRow {
    /// Create a row from its five fields.
    pub fn new(
        discipline: impl Into<String>,
        name: impl Into<String>,
        performance: impl Into<String>,
        place: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        RecordRow {
            discipline: discipline.into(),
            name: name.into(),
            performance: performance.into(),
            place: place.into(),
            date: date.into(),
        }
    }

    /// Lossy constructor for display purposes: pads missing fields with
    /// empty strings and truncates extras. Parsing never uses this; rows of
    /// the wrong shape are dropped there.
    pub fn from_fields(fields: Vec<String>) -> Self {
        let mut it = fields.into_iter().chain(std::iter::repeat(String::new()));
        RecordRow {
            discipline: it.next().unwrap_or_default(),
            name: it.next().unwrap_or_default(),
            performance: it.next().unwrap_or_default(),
            place: it.next().unwrap_or_default(),
            date: it.next().unwrap_or_default(),
        }
    }

    /// The five fields in column order.
    pub fn fields(&self) -> [&str; RECORD_FIELDS] {
        [&self.discipline, &self.name, &self.performance, &self.place, &self.date]
    }
}

/// The editable list of rows for one records page.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    rows: Vec<RecordRow>,
    modified: bool,
}

impl RecordSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_rows(rows: Vec<RecordRow>) -> Self {
        RecordSet { rows, modified: false }
    }

    /// The rows in table order.
    pub fn rows(&self) -> &[RecordRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at an index, if in range.
    pub fn get(&self, index: usize) -> Option<&RecordRow> {
        self.rows.get(index)
    }

    /// Append a row.
    pub fn add(&mut self, row: RecordRow) {
        self.rows.push(row);
        self.modified = true;
    }

    /// Insert a row before `index` (`index == len` appends).
    pub fn insert(&mut self, index: usize, row: RecordRow) -> Result<()> {
        if index > self.rows.len() {
            return Err(Error::IndexOutOfRange { index, len: self.rows.len() });
        }
        self.rows.insert(index, row);
        self.modified = true;
        Ok(())
    }

    /// Replace the row at `index`.
    pub fn update(&mut self, index: usize, row: RecordRow) -> Result<()> {
        match self.rows.get_mut(index) {
            Some(slot) => {
                *slot = row;
                self.modified = true;
                Ok(())
            }
            None => Err(Error::IndexOutOfRange { index, len: self.rows.len() }),
        }
    }

    /// Remove and return the row at `index`.
    pub fn remove(&mut self, index: usize) -> Result<RecordRow> {
        if index >= self.rows.len() {
            return Err(Error::IndexOutOfRange { index, len: self.rows.len() });
        }
        self.modified = true;
        Ok(self.rows.remove(index))
    }

    /// Whether the set changed since it was parsed or last saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

/// Locate the records table body: the tagged table's `<tbody>`, or any
/// `<tbody>` as fallback.
fn find_tbody(doc: &Document) -> Option<NodeId> {
    let root = doc.root();
    let tagged = doc
        .find_element(root, |el| el.name == "table" && el.has_class("records-table"))
        .and_then(|table| doc.find_element(table, |el| el.name == "tbody"));
    tagged.or_else(|| doc.find_element(root, |el| el.name == "tbody"))
}

/// Parse a records page into a [`RecordSet`].
///
/// Absence of any `<tbody>` is a hard failure; rows that do not have exactly
/// five direct `<td>` children are logged and dropped.
pub fn parse(store: &mut DocumentStore, path: &Path) -> Result<RecordSet> {
    let doc = store.load(path)?;
    let tbody = find_tbody(doc).ok_or_else(|| Error::AnchorNotFound {
        anchor: "<tbody>".to_string(),
        path: path.to_path_buf(),
    })?;

    let mut rows = Vec::new();
    for tr in doc.child_elements(tbody).collect::<Vec<_>>() {
        if !doc.is_element_named(tr, "tr") {
            continue;
        }
        let cells: Vec<String> = doc
            .children(tr)
            .filter(|&c| doc.is_element_named(c, "td"))
            .map(|td| doc.text_of(td))
            .collect();
        if cells.len() == RECORD_FIELDS {
            rows.push(RecordRow::from_fields(cells));
        } else {
            log::warn!(
                "dropping row with {} cell(s) (expected {}) in '{}'",
                cells.len(),
                RECORD_FIELDS,
                path.display()
            );
        }
    }
    Ok(RecordSet::from_rows(rows))
}

/// Write a [`RecordSet`] back into its page and flush the file.
///
/// Destructive rebuild of the `<tbody>`: saving an empty set clears every
/// row. Confirmation of that is the caller's concern.
pub fn save(store: &mut DocumentStore, path: &Path, set: &mut RecordSet) -> Result<()> {
    let doc = store.load(path)?;
    let tbody = find_tbody(doc).ok_or_else(|| Error::AnchorNotFound {
        anchor: "<tbody>".to_string(),
        path: path.to_path_buf(),
    })?;

    doc.clear_children(tbody);
    let nl = doc.create_text("\n");
    doc.append_child(tbody, nl);

    for row in set.rows() {
        let tr = doc.create_element(Element::new("tr"));
        let indent = doc.create_text("\n  ");
        doc.append_child(tr, indent);
        for field in row.fields() {
            let td = doc.create_element(Element::new("td"));
            let text = doc.create_text(escape_text(field));
            doc.append_child(td, text);
            doc.append_child(tr, td);
            let indent = doc.create_text("\n  ");
            doc.append_child(tr, indent);
        }
        // The trailing cell indent becomes the closing newline.
        if let Some(last) = doc.last_child(tr) {
            if doc.text_content(last).is_some_and(|t| t.trim().is_empty()) {
                doc.detach(last);
            }
        }
        let closing = doc.create_text("\n");
        doc.append_child(tr, closing);
        doc.append_child(tbody, tr);
        let between = doc.create_text("\n");
        doc.append_child(tbody, between);
    }

    store.flush(path)?;
    set.modified = false;
    Ok(())
}

/// Discover the records pages under the base directory.
///
/// Categories are the base directory's subdirectories (sorted); within each,
/// every `.html` file becomes an entry whose display name derives from the
/// file stem (`indoor-records` → `Indoor Records`).
pub fn discover_record_files(base_dir: &Path) -> IndexMap<String, IndexMap<String, PathBuf>> {
    let mut structure = IndexMap::new();
    let entries = match std::fs::read_dir(base_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("records base directory '{}' not readable: {}", base_dir.display(), e);
            return structure;
        }
    };

    let mut categories: Vec<PathBuf> =
        entries.flatten().map(|e| e.path()).filter(|p| p.is_dir()).collect();
    categories.sort();

    for category_path in categories {
        let Some(category) = category_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let mut files: Vec<PathBuf> = match std::fs::read_dir(&category_path) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| e.eq_ignore_ascii_case("html"))
                })
                .collect(),
            Err(e) => {
                log::warn!("cannot read category '{}': {}", category_path.display(), e);
                continue;
            }
        };
        files.sort();

        let mut pages = IndexMap::new();
        for file in files {
            if let Some(stem) = file.file_stem().and_then(|s| s.to_str()) {
                pages.insert(display_name(stem), file.clone());
            }
        }
        structure.insert(category.to_string(), pages);
    }
    structure
}

/// Derive a display name from a file stem: hyphen-separated words,
/// each capitalized.
fn display_name(stem: &str) -> String {
    stem.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
