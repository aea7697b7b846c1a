//! Error types for the site editing library.
//!
//! This module defines all error types that can occur while loading, editing
//! and rewriting the site's HTML documents and the news JSON store.

use std::path::PathBuf;

/// Result type alias for site editing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document loading, editing and saving.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file unreadable, write failure)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Both strict and lenient parsing failed for a document
    #[error("Failed to parse '{path}': {reason}")]
    Parse {
        /// Path of the document that could not be parsed
        path: PathBuf,
        /// Diagnostic from the last parse attempt
        reason: String,
    },

    /// Strict-mode syntax rejection at a specific byte offset
    #[error("Syntax error at byte {offset}: {reason}")]
    Syntax {
        /// Byte offset where the error occurred
        offset: usize,
        /// Reason for the rejection
        reason: String,
    },

    /// Element nesting exceeded the configured depth limit
    #[error("Nesting depth limit exceeded (max: {0})")]
    DepthLimitExceeded(usize),

    /// The domain's anchor substructure is absent from the document
    #[error("Anchor '{anchor}' not found in '{path}'")]
    AnchorNotFound {
        /// Description of the expected substructure
        anchor: String,
        /// Path of the document that was searched
        path: PathBuf,
    },

    /// Flush or lookup of a path that was never loaded into the store
    #[error("Document not loaded: '{0}'")]
    DocumentNotLoaded(PathBuf),

    /// A node handle no longer matches the document's generation
    #[error("Stale node reference: the document changed since this node was found, rescan required")]
    StaleNode,

    /// Refusal to remove a structural element of the document
    #[error("Cannot remove protected element <{0}>")]
    ProtectedElement(String),

    /// Adjacent insertion with a tag outside the allow-list
    #[error("Tag <{0}> is not allowed for insertion")]
    TagNotAllowed(String),

    /// CRUD index outside the current list bounds
    #[error("Index {index} out of range (len: {len})")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// Current length of the list
        len: usize,
    },

    /// Date string is not a valid zero-padded YYYY-MM-DD date
    #[error("Invalid date: '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// A required field was empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// News article id does not match `^[a-z0-9-]+$`
    #[error("Invalid article id: '{0}' (only a-z, 0-9 and '-' allowed)")]
    InvalidArticleId(String),

    /// News article id already exists in the feed
    #[error("Article id '{0}' already exists")]
    DuplicateArticleId(String),

    /// News data file holds something other than a JSON array
    #[error("Invalid news data in '{path}': {reason}")]
    InvalidNewsData {
        /// Path of the news JSON file
        path: PathBuf,
        /// What was wrong with the data
        reason: String,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
