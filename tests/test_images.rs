//! Integration tests for the image reference inventory.

use std::fs;
use std::path::PathBuf;

use sitewright::images;
use sitewright::{DocumentStore, SiteConfig};
use tempfile::tempdir;

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
  <img src="/images/logo.png" alt="Clublogo">
  <img src="/images/verdwenen.png" alt="Weg">
  <img src="https://cdn.example.com/extern.png" alt="Extern">
  <img src="data:image/gif;base64,R0lGOD" alt="Inline">
  <img alt="Zonder bron">
</body>
</html>
"#;

const NEWS_PAGE: &str = r#"<html>
<body>
  <img src="/images/logo.png" alt="Nogmaals het logo">
</body>
</html>
"#;

/// Build a site checkout in a tempdir: two pages plus one real image file.
fn build_site(dir: &std::path::Path) -> (SiteConfig, Vec<PathBuf>) {
    fs::create_dir_all(dir.join("images")).unwrap();
    fs::write(dir.join("images/logo.png"), b"png-bytes").unwrap();
    let index = dir.join("index.html");
    fs::write(&index, INDEX_PAGE).unwrap();
    let news = dir.join("nieuws.html");
    fs::write(&news, NEWS_PAGE).unwrap();
    (SiteConfig::new(dir), vec![index, news])
}

#[test]
fn test_scan_tracks_local_images_only() {
    let dir = tempdir().unwrap();
    let (config, files) = build_site(dir.path());
    let mut store = DocumentStore::new();

    let refs = images::scan(&config, &mut store, &files);
    // External, inline and src-less images are skipped.
    assert_eq!(refs.len(), 3);
    assert_eq!(refs[0].src, "/images/logo.png");
    assert!(refs[0].exists);
    assert_eq!(refs[1].src, "/images/verdwenen.png");
    assert!(!refs[1].exists);
    assert_eq!(refs[2].html_file, files[1]);
}

#[test]
fn test_aggregate_counts_usage_across_pages() {
    let dir = tempdir().unwrap();
    let (config, files) = build_site(dir.path());
    let mut store = DocumentStore::new();

    let refs = images::scan(&config, &mut store, &files);
    let usage = images::aggregate(&refs);
    assert_eq!(usage.len(), 2);

    let logo = &usage[&dir.path().join("images/logo.png")];
    assert_eq!(logo.usage_count, 2);
    assert_eq!(logo.html_files.len(), 2);
    assert!(logo.exists);

    let gone = &usage[&dir.path().join("images/verdwenen.png")];
    assert_eq!(gone.usage_count, 1);
    assert!(!gone.exists);
}

#[test]
fn test_set_src_rewrites_attribute() {
    let dir = tempdir().unwrap();
    let (config, files) = build_site(dir.path());
    let mut store = DocumentStore::new();

    let mut refs = images::scan(&config, &mut store, &files);
    images::set_src(&config, &mut store, &mut refs[1], "/images/logo.png").unwrap();
    assert!(refs[1].exists);
    assert_eq!(refs[1].resolved_path, dir.path().join("images/logo.png"));

    let written = fs::read_to_string(&files[0]).unwrap();
    assert!(!written.contains("verdwenen.png"));
    // Attribute order and the rest of the tag are untouched.
    assert!(written.contains(r#"<img src="/images/logo.png" alt="Weg">"#));
}

#[test]
fn test_set_src_keeps_other_handles_usable() {
    let dir = tempdir().unwrap();
    let (config, files) = build_site(dir.path());
    let mut store = DocumentStore::new();

    let mut refs = images::scan(&config, &mut store, &files);
    images::set_src(&config, &mut store, &mut refs[1], "/images/ander.png").unwrap();
    // Attribute edits are not structural; the first reference still works.
    images::set_src(&config, &mut store, &mut refs[0], "/images/logo.png").unwrap();
}
