//! Document loading, caching and flushing.
//!
//! [`DocumentStore`] is the single owner of parsed trees. A document is
//! loaded once per (canonicalized) path and cached, so every extractor that
//! asks for the same file works against the same tree — including the text
//! and image scanners, which mutate that shared tree in place.
//!
//! Loading tries the strict parser first and falls back to the lenient
//! parser on failure (logged); only a double failure is terminal. Writing is
//! the single named [`DocumentStore::flush`] operation: it serializes the
//! cached tree and overwrites the file whole. Writes are plain overwrites,
//! not atomic renames; a crash mid-write can truncate the file.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::parser::{parse_document, ParserOptions};
use crate::serializer;

/// Cache of parsed documents keyed by canonical path.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<PathBuf, Document>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical cache key for a path. The file must exist.
    fn key(path: &Path) -> Result<PathBuf> {
        Ok(fs::canonicalize(path)?)
    }

    /// Load a document, reusing the cached tree when present.
    ///
    /// Parses strict first; on failure retries lenient with a warning. When
    /// both modes fail the error carries the path and both diagnostics.
    pub fn load(&mut self, path: &Path) -> Result<&mut Document> {
        let key = Self::key(path)?;
        if !self.documents.contains_key(&key) {
            let source = fs::read_to_string(&key)?;
            let doc = match parse_document(&source, ParserOptions::strict()) {
                Ok(doc) => doc,
                Err(strict_err) => {
                    log::warn!(
                        "strict parse of '{}' failed ({}), retrying lenient",
                        path.display(),
                        strict_err
                    );
                    parse_document(&source, ParserOptions::lenient()).map_err(|lenient_err| {
                        Error::Parse {
                            path: path.to_path_buf(),
                            reason: format!("{strict_err}; lenient retry: {lenient_err}"),
                        }
                    })?
                }
            };
            self.documents.insert(key.clone(), doc);
        }
        self.documents.get_mut(&key).ok_or_else(|| Error::DocumentNotLoaded(key))
    }

    /// Whether a document for this path is currently cached.
    pub fn is_loaded(&self, path: &Path) -> bool {
        Self::key(path).map(|key| self.documents.contains_key(&key)).unwrap_or(false)
    }

    /// Shared access to an already-loaded document.
    pub fn get(&self, path: &Path) -> Result<&Document> {
        let key = Self::key(path)?;
        self.documents.get(&key).ok_or(Error::DocumentNotLoaded(key))
    }

    /// Mutable access to an already-loaded document.
    pub fn get_mut(&mut self, path: &Path) -> Result<&mut Document> {
        let key = Self::key(path)?;
        self.documents.get_mut(&key).ok_or(Error::DocumentNotLoaded(key))
    }

    /// Drop a cached tree so the next [`load`](Self::load) re-reads the file.
    pub fn evict(&mut self, path: &Path) {
        if let Ok(key) = Self::key(path) {
            self.documents.remove(&key);
        }
    }

    /// Drop every cached tree.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    /// Serialize the cached tree for a path and overwrite the file.
    ///
    /// Fails with [`Error::DocumentNotLoaded`] when the path was never
    /// loaded. The in-memory tree stays cached and authoritative; a write
    /// failure leaves it untouched so the caller can retry.
    pub fn flush(&mut self, path: &Path) -> Result<()> {
        let key = Self::key(path)?;
        let doc = self.documents.get(&key).ok_or(Error::DocumentNotLoaded(key.clone()))?;
        fs::write(&key, serializer::serialize(doc))?;
        Ok(())
    }
}

/// Recursively collect the HTML files under the given scan targets.
///
/// Targets may be files or directories; matching is by `.html`/`.htm`
/// extension, case-insensitive. Missing targets are skipped. Returns the
/// sorted, deduplicated paths plus the count.
pub fn find_html_files(targets: &[PathBuf]) -> (Vec<PathBuf>, usize) {
    let mut found = BTreeSet::new();
    for target in targets {
        if target.is_file() {
            if has_html_extension(target) {
                found.insert(target.clone());
            }
        } else if target.is_dir() {
            collect_dir(target, &mut found);
        }
    }
    let files: Vec<PathBuf> = found.into_iter().collect();
    let count = files.len();
    (files, count)
}

fn collect_dir(dir: &Path, found: &mut BTreeSet<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot read directory '{}': {}", dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_dir(&path, found);
        } else if has_html_extension(&path) {
            found.insert(path);
        }
    }
}

fn has_html_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}
