//! Integration tests for the JSON-backed news feed.

use std::fs;

use sitewright::news::{self, NewsFeed};
use sitewright::Error;
use tempfile::tempdir;

#[test]
fn test_missing_file_gives_empty_feed() {
    let dir = tempdir().unwrap();
    let feed = NewsFeed::load(dir.path().join("nieuws/nieuws-data.json")).unwrap();
    assert!(feed.is_empty());
}

#[test]
fn test_empty_file_gives_empty_feed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nieuws-data.json");
    fs::write(&path, "  \n").unwrap();
    let feed = NewsFeed::load(&path).unwrap();
    assert!(feed.is_empty());
}

#[test]
fn test_non_array_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nieuws-data.json");
    fs::write(&path, r#"{"id": "los-object"}"#).unwrap();
    let err = NewsFeed::load(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidNewsData { .. }));
}

#[test]
fn test_malformed_json_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nieuws-data.json");
    fs::write(&path, "[{]").unwrap();
    let err = NewsFeed::load(&path).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn test_load_sorts_newest_first() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nieuws-data.json");
    fs::write(
        &path,
        r#"[
  {"id": "oud", "date": "2024-03-01", "title": "Oud bericht"},
  {"id": "nieuw", "date": "2026-01-15", "title": "Nieuw bericht"},
  {"id": "midden", "date": "2025-06-30", "title": "Tussenin"}
]"#,
    )
    .unwrap();

    let feed = NewsFeed::load(&path).unwrap();
    let ids: Vec<&str> = feed.articles().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["nieuw", "midden", "oud"]);
    // Fields the file omits fall back to their defaults.
    assert_eq!(feed.articles()[0].category, news::DEFAULT_CATEGORY);
    assert_eq!(feed.articles()[0].image, news::DEFAULT_IMAGE);
}

#[test]
fn test_add_and_save_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nieuws/nieuws-data.json");

    let mut feed = NewsFeed::load(&path).unwrap();
    feed.add(
        "clubrecord-100m",
        "2026-06-14",
        "Nieuw clubrecord op de 100m",
        "Wedstrijden",
        "",
        "",
        "Jan liep 10.79!\nZie www.atletiek.nl voor de uitslag.",
    )
    .unwrap();
    feed.save().unwrap();
    assert!(!feed.is_modified());

    // Parent directory is created on demand; the stored body carries the
    // <br> conversion and the auto-generated link.
    let reloaded = NewsFeed::load(&path).unwrap();
    assert_eq!(reloaded.len(), 1);
    let article = &reloaded.articles()[0];
    assert_eq!(article.summary, "Nieuw clubrecord op de 100m");
    assert!(article.full_content.contains("Jan liep 10.79!<br>"));
    assert!(article.full_content.contains(r#"<a href="https://www.atletiek.nl"#));
    assert!(article.full_content.contains(r#"target="_blank""#));
}

#[test]
fn test_save_keeps_feed_sorted_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nieuws-data.json");

    let mut feed = NewsFeed::load(&path).unwrap();
    feed.add("a", "2024-01-01", "Oudste", "", "", "", "").unwrap();
    feed.add("b", "2026-01-01", "Nieuwste", "", "", "", "").unwrap();
    feed.add("c", "2025-01-01", "Midden", "", "", "", "").unwrap();
    feed.save().unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let dates: Vec<&str> =
        parsed.as_array().unwrap().iter().map(|a| a["date"].as_str().unwrap()).collect();
    assert_eq!(dates, ["2026-01-01", "2025-01-01", "2024-01-01"]);
}

#[test]
fn test_duplicate_id_is_rejected_across_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nieuws-data.json");

    let mut feed = NewsFeed::load(&path).unwrap();
    feed.add("uniek-id", "2026-01-01", "Eerste", "", "", "", "").unwrap();
    feed.save().unwrap();

    let mut reloaded = NewsFeed::load(&path).unwrap();
    let err = reloaded.add("uniek-id", "2026-02-01", "Tweede", "", "", "", "").unwrap_err();
    assert!(matches!(err, Error::DuplicateArticleId(_)));
}
