//! News article store.
//!
//! The news section is the one domain that is not HTML-backed: articles live
//! in a JSON array (`nieuws-data.json`) rendered client-side. This module
//! loads and saves that array with serde, keeps it sorted newest-first, and
//! applies the body rewrites the site expects: URLs and e-mail addresses
//! become anchors, line breaks become `<br>`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Category used when an article doesn't name one.
pub const DEFAULT_CATEGORY: &str = "Algemeen";

/// Image filename used when an article doesn't name one.
pub const DEFAULT_IMAGE: &str = "nieuws-beeld.png";

lazy_static! {
    static ref ARTICLE_ID_RE: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
    static ref ISO_DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref EMAIL_RE: Regex =
        Regex::new(r"\b([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})\b").unwrap();
    // One optional preceding character is captured so replacement can skip
    // URLs already inside an attribute value (`"`) or an anchor body (`>`).
    static ref URL_RE: Regex =
        Regex::new(r#"(^|[^">])((?:https?://|www\.)[^\s<>"]+)"#).unwrap();
}

/// One news article as stored in the JSON array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Unique lowercase id (`a-z`, `0-9`, `-`).
    pub id: String,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    /// Article title.
    pub title: String,
    /// Category label.
    #[serde(default = "default_category")]
    pub category: String,
    /// Image filename under the news image directory.
    #[serde(default = "default_image")]
    pub image: String,
    /// Short text for the article list.
    #[serde(default)]
    pub summary: String,
    /// Full body, stored as HTML (links and `<br>` applied on add).
    #[serde(default)]
    pub full_content: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

/// Wrap bare URLs and e-mail addresses in anchor tags.
///
/// E-mails become `mailto:` links. URLs get `target="_blank"` and a
/// `rel="noopener noreferrer"`; a `www.` URL is linked with an `https://`
/// href while keeping the visible text as written. URLs directly preceded
/// by `"` or `>` are already part of markup and are left alone.
pub fn auto_link_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let linked = EMAIL_RE.replace_all(text, r#"<a href="mailto:$1">$1</a>"#);
    URL_RE
        .replace_all(&linked, |caps: &Captures| {
            let prefix = &caps[1];
            let url = &caps[2];
            let href = if url.starts_with("www.") {
                format!("https://{url}")
            } else {
                url.to_string()
            };
            format!(
                r#"{prefix}<a href="{href}" target="_blank" rel="noopener noreferrer">{url}</a>"#
            )
        })
        .into_owned()
}

/// Convert a raw article body to stored HTML: auto-link, then turn line
/// breaks into `<br>`.
fn process_content(raw: &str) -> String {
    auto_link_text(raw).replace("\r\n", "<br>").replace('\n', "<br>")
}

/// Load the article array from disk.
///
/// A missing or empty file is not an error: editing starts from an empty
/// feed. A file whose top-level value is not an array is rejected with
/// [`Error::InvalidNewsData`]. Articles are sorted newest-first.
pub fn load_articles(path: &Path) -> Result<Vec<NewsArticle>> {
    if !path.exists() {
        log::info!("'{}' not found, starting with an empty feed", path.display());
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        log::info!("'{}' is empty, starting with an empty feed", path.display());
        return Ok(Vec::new());
    }
    let value: serde_json::Value = serde_json::from_str(&content)?;
    if !value.is_array() {
        return Err(Error::InvalidNewsData {
            path: path.to_path_buf(),
            reason: "top-level value is not an array".to_string(),
        });
    }
    let mut articles: Vec<NewsArticle> = serde_json::from_value(value)?;
    articles.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(articles)
}

/// Write the article array to disk, newest-first, pretty-printed.
///
/// Creates the parent directory when missing.
pub fn save_articles(path: &Path, articles: &mut [NewsArticle]) -> Result<()> {
    articles.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(articles)?;
    fs::write(path, json)?;
    log::info!("wrote {} article(s) to '{}'", articles.len(), path.display());
    Ok(())
}

/// The news feed: the article array plus its file location.
#[derive(Debug)]
pub struct NewsFeed {
    path: PathBuf,
    articles: Vec<NewsArticle>,
    modified: bool,
}

impl NewsFeed {
    /// Load the feed from a JSON file (missing or empty file gives an empty
    /// feed).
    pub fn load(path: impl Into<PathBuf>) -> Result<NewsFeed> {
        let path = path.into();
        let articles = load_articles(&path)?;
        Ok(NewsFeed { path, articles, modified: false })
    }

    /// The articles, newest-first.
    pub fn articles(&self) -> &[NewsArticle] {
        &self.articles
    }

    /// Number of articles in the feed.
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Whether the feed holds no articles.
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Whether the feed changed since load or last save.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Validate and add a new article to the front of the feed.
    ///
    /// The id must match `^[a-z0-9-]+$` and be unused; the date must be a
    /// real zero-padded `YYYY-MM-DD`; the title must be non-blank. An empty
    /// category or image falls back to the defaults, an empty summary falls
    /// back to the title, and the raw body is auto-linked with line breaks
    /// turned into `<br>`.
    pub fn add(
        &mut self,
        id: &str,
        date: &str,
        title: &str,
        category: &str,
        image: &str,
        summary: &str,
        raw_content: &str,
    ) -> Result<&NewsArticle> {
        let id = id.trim().to_lowercase();
        if !ARTICLE_ID_RE.is_match(&id) {
            return Err(Error::InvalidArticleId(id));
        }
        if self.articles.iter().any(|a| a.id == id) {
            return Err(Error::DuplicateArticleId(id));
        }
        let date = date.trim();
        if !ISO_DATE_RE.is_match(date) || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(Error::InvalidDate(date.to_string()));
        }
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::MissingField("title"));
        }
        let category = category.trim();
        let image = image.trim();
        let summary = summary.trim();
        let article = NewsArticle {
            id,
            date: date.to_string(),
            title: title.to_string(),
            category: if category.is_empty() { default_category() } else { category.to_string() },
            image: if image.is_empty() { default_image() } else { image.to_string() },
            summary: if summary.is_empty() { title.to_string() } else { summary.to_string() },
            full_content: process_content(raw_content.trim()),
        };
        self.articles.insert(0, article);
        self.modified = true;
        Ok(&self.articles[0])
    }

    /// Remove and return the article at `index` (newest-first order).
    pub fn remove(&mut self, index: usize) -> Result<NewsArticle> {
        if index >= self.articles.len() {
            return Err(Error::IndexOutOfRange { index, len: self.articles.len() });
        }
        self.modified = true;
        Ok(self.articles.remove(index))
    }

    /// Write the feed back to its JSON file, newest-first.
    pub fn save(&mut self) -> Result<()> {
        save_articles(&self.path, &mut self.articles)?;
        self.modified = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================
    // Auto-linking
    // ============================================================

    #[test]
    fn test_auto_link_bare_url() {
        let out = auto_link_text("Zie https://example.com/agenda voor meer.");
        assert_eq!(
            out,
            "Zie <a href=\"https://example.com/agenda\" target=\"_blank\" \
             rel=\"noopener noreferrer\">https://example.com/agenda</a> voor meer."
        );
    }

    #[test]
    fn test_auto_link_www_gets_https_href() {
        let out = auto_link_text("Kijk op www.atletiek.nl!");
        assert!(out.contains("href=\"https://www.atletiek.nl!\"") || out.contains("href=\"https://www.atletiek.nl"));
        assert!(out.contains(">www.atletiek.nl"));
    }

    #[test]
    fn test_auto_link_email() {
        let out = auto_link_text("Mail info@club.nl aub.");
        assert_eq!(out, "Mail <a href=\"mailto:info@club.nl\">info@club.nl</a> aub.");
    }

    #[test]
    fn test_auto_link_skips_existing_markup() {
        let input = r#"<a href="https://example.com">tekst</a>"#;
        assert_eq!(auto_link_text(input), input);
    }

    #[test]
    fn test_auto_link_url_at_start() {
        let out = auto_link_text("https://example.com is de site.");
        assert!(out.starts_with("<a href=\"https://example.com\""));
    }

    #[test]
    fn test_auto_link_empty() {
        assert_eq!(auto_link_text(""), "");
    }

    #[test]
    fn test_process_content_line_breaks() {
        assert_eq!(process_content("regel 1\r\nregel 2\nregel 3"), "regel 1<br>regel 2<br>regel 3");
    }

    // ============================================================
    // Feed validation
    // ============================================================

    fn empty_feed() -> NewsFeed {
        NewsFeed { path: PathBuf::from("/nonexistent/nieuws-data.json"), articles: Vec::new(), modified: false }
    }

    #[test]
    fn test_add_fills_defaults() {
        let mut feed = empty_feed();
        let article =
            feed.add("clubkampioenschappen", "2026-05-01", "Clubkampioenschappen", "", "", "", "")
                .unwrap();
        assert_eq!(article.category, DEFAULT_CATEGORY);
        assert_eq!(article.image, DEFAULT_IMAGE);
        assert_eq!(article.summary, "Clubkampioenschappen");
        assert!(feed.is_modified());
    }

    #[test]
    fn test_add_prepends() {
        let mut feed = empty_feed();
        feed.add("eerste", "2026-01-01", "Eerste", "", "", "", "").unwrap();
        feed.add("tweede", "2026-02-01", "Tweede", "", "", "", "").unwrap();
        assert_eq!(feed.articles()[0].id, "tweede");
    }

    #[test]
    fn test_add_rejects_invalid_id() {
        let mut feed = empty_feed();
        let err = feed.add("Nee Toch", "2026-01-01", "Titel", "", "", "", "").unwrap_err();
        assert!(matches!(err, Error::InvalidArticleId(_)));
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut feed = empty_feed();
        feed.add("uniek", "2026-01-01", "Titel", "", "", "", "").unwrap();
        let err = feed.add("uniek", "2026-01-02", "Ander", "", "", "", "").unwrap_err();
        assert!(matches!(err, Error::DuplicateArticleId(id) if id == "uniek"));
    }

    #[test]
    fn test_add_rejects_bad_date() {
        let mut feed = empty_feed();
        let err = feed.add("a", "2026-2-1", "Titel", "", "", "", "").unwrap_err();
        assert!(matches!(err, Error::InvalidDate(_)));
        let err = feed.add("a", "2026-02-30", "Titel", "", "", "", "").unwrap_err();
        assert!(matches!(err, Error::InvalidDate(_)));
    }

    #[test]
    fn test_add_requires_title() {
        let mut feed = empty_feed();
        let err = feed.add("a", "2026-01-01", "   ", "", "", "", "").unwrap_err();
        assert!(matches!(err, Error::MissingField("title")));
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut feed = empty_feed();
        let err = feed.remove(0).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 0, len: 0 }));
    }
}
