//! # SiteWright
//!
//! HTML-backed structured-data editing for a static club website.
//!
//! The site's content lives directly in its HTML pages: record tables,
//! a month-grid competition calendar, year-grouped report archives, free
//! text, image references — plus one JSON-backed news feed. SiteWright
//! parses those pages into mutable trees, exposes each content domain as
//! typed data, and writes edits back by rewriting the anchored substructure
//! in place while leaving the rest of the file byte-for-byte intact.
//!
//! ## Core Features
//!
//! ### Parsing & Round-Trip
//! - **Whitespace-exact trees**: text nodes keep raw source text, entities
//!   undecoded, so an unedited document serializes back verbatim
//! - **Strict/lenient modes**: strict parsing rejects malformed markup with
//!   a byte offset; loading falls back to lenient recovery automatically
//! - **Document store**: one cached tree per file, whole-file flush on save
//!
//! ### Content Domains
//! - **Records**: 5-column club record tables, row-level CRUD
//! - **Calendar**: month-grid event markers with a fixed color set, kept
//!   date-sorted
//! - **Reports**: year-grouped download links, years descending
//! - **Text snippets**: scan/edit/delete free text through live node
//!   handles that fail fast when the tree changes under them
//! - **Images**: site-wide `<img>` inventory with existence checks
//! - **News**: JSON article feed with auto-linked bodies
//!
//! ## Quick Start
//!
//! ```ignore
//! use sitewright::{DocumentStore, SiteConfig};
//! use sitewright::records;
//!
//! # fn main() -> sitewright::Result<()> {
//! let config = SiteConfig::new("/var/www/site");
//! let mut store = DocumentStore::new();
//!
//! let path = config.records_base_dir.join("outdoor/senioren-mannen.html");
//! let mut records = records::parse(&mut store, &path)?;
//! records.add(records::RecordRow::new(
//!     "100m", "J. Jansen", "10.85", "Amsterdam", "2025-06-14",
//! ));
//! records::save(&mut store, &path, &mut records)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core HTML parsing
pub mod dom;
pub mod lexer;
pub mod parser;
pub mod serializer;

// Document cache and file discovery
pub mod loader;

// Site layout and fixed tables
pub mod config;

// Content domains
pub mod calendar;
pub mod images;
pub mod news;
pub mod records;
pub mod reports;
pub mod snippets;

// Re-exports
pub use config::SiteConfig;
pub use dom::{Document, Element, NodeData, NodeHandle};
pub use error::{Error, Result};
pub use loader::DocumentStore;
pub use parser::ParserOptions;

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
