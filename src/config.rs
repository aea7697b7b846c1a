//! Site configuration.
//!
//! [`SiteConfig`] locates the per-domain files under one site root, following
//! the layout the site actually uses; the `with_*` builders override single
//! locations for non-standard layouts (and tests). The fixed tables live
//! here too: the Dutch month-name map for calendar titles, the tags the
//! text scanner skips, and the tags allowed for adjacent insertion.

use std::path::{Path, PathBuf};

/// Tags whose text content the snippet scanner never offers for editing.
pub const EXCLUDED_TEXT_TAGS: &[&str] = &["script", "style"];

/// Tags a caller may insert adjacent to an existing snippet's parent.
pub const ADJACENT_INSERT_TAGS: &[&str] =
    &["p", "h1", "h2", "h3", "h4", "h5", "h6", "div", "blockquote"];

/// Map a Dutch month name (any case) to its 1-12 number.
pub fn month_number(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "januari" => Some(1),
        "februari" => Some(2),
        "maart" => Some(3),
        "april" => Some(4),
        "mei" => Some(5),
        "juni" => Some(6),
        "juli" => Some(7),
        "augustus" => Some(8),
        "september" => Some(9),
        "oktober" => Some(10),
        "november" => Some(11),
        "december" => Some(12),
        _ => None,
    }
}

/// Locations of the site's editable files, all under one root.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Root directory of the website checkout.
    pub site_root: PathBuf,
    /// The records category directories live here.
    pub records_base_dir: PathBuf,
    /// The month-grid calendar page.
    pub calendar_path: PathBuf,
    /// The year-grouped reports page.
    pub reports_path: PathBuf,
    /// The news JSON store.
    pub news_data_path: PathBuf,
    /// Files and directories the text/image scanners walk.
    pub scan_targets: Vec<PathBuf>,
}

impl SiteConfig {
    /// Configuration for the standard site layout under `site_root`.
    pub fn new(site_root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = site_root.into();
        SiteConfig {
            records_base_dir: root.join("html/clubrecords"),
            calendar_path: root.join("html/wedstrijden/kalender.html"),
            reports_path: root.join("html/downloads/bestuursverslagen.html"),
            news_data_path: root.join("html/nieuws/nieuws-data.json"),
            scan_targets: vec![root.join("index.html"), root.join("html")],
            site_root: root,
        }
    }

    /// Override the records base directory.
    pub fn with_records_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.records_base_dir = dir.into();
        self
    }

    /// Override the calendar page location.
    pub fn with_calendar_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.calendar_path = path.into();
        self
    }

    /// Override the reports page location.
    pub fn with_reports_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.reports_path = path.into();
        self
    }

    /// Override the news JSON store location.
    pub fn with_news_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.news_data_path = path.into();
        self
    }

    /// Override the text/image scan targets.
    pub fn with_scan_targets(mut self, targets: Vec<PathBuf>) -> Self {
        self.scan_targets = targets;
        self
    }

    /// Whether a tag is excluded from text scanning.
    pub fn is_excluded_text_tag(name: &str) -> bool {
        EXCLUDED_TEXT_TAGS.contains(&name)
    }

    /// Whether a tag may be inserted adjacent to a snippet's parent.
    pub fn is_allowed_insert_tag(name: &str) -> bool {
        ADJACENT_INSERT_TAGS.contains(&name)
    }
}

/// Resolve a site-relative `src` (possibly with a leading `/`) against the
/// site root, lexically normalizing `.` and `..` components.
pub fn resolve_site_path(site_root: &Path, src: &str) -> PathBuf {
    let trimmed = src.trim_start_matches('/');
    let mut resolved = site_root.to_path_buf();
    for component in Path::new(trimmed).components() {
        use std::path::Component;
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => resolved.push(part),
            // Absolute prefixes were stripped above; anything else is kept out.
            _ => {}
        }
    }
    resolved
}
