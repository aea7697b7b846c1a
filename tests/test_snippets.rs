//! Integration tests for free-text snippet editing.

use std::fs;
use std::path::PathBuf;

use sitewright::snippets::{self, InsertPosition};
use sitewright::{DocumentStore, Error};
use tempfile::tempdir;

const TEXT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Over ons</title>
  <style>body { color: #333; }</style>
  <script>var teller = 1;</script>
</head>
<body>
  <!-- redactie: intro niet weghalen -->
  <h1>Over de club</h1>
  <p>Opgericht in 1954.</p>
  <p>Train mee op dinsdag &amp; donderdag.</p>
  Losse tekst onder body.
</body>
</html>
"#;

fn write_text_page(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("over-ons.html");
    fs::write(&path, TEXT_PAGE).unwrap();
    path
}

mod scanning {
    use super::*;

    #[test]
    fn test_scan_finds_visible_text_only() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let snippets = snippets::scan(&mut store, &[path]);
        let texts: Vec<&str> = snippets.iter().map(|s| s.display_text.as_str()).collect();
        // Style/script content, comments and whitespace-only runs are
        // excluded; entities stay raw in the stored text.
        assert_eq!(
            texts,
            [
                "Over ons",
                "Over de club",
                "Opgericht in 1954.",
                "Train mee op dinsdag &amp; donderdag.",
                "   Losse tekst onder body. ",
            ]
        );
        assert_eq!(snippets[2].original_text, "Opgericht in 1954.");
    }

    #[test]
    fn test_scan_ids_continue_across_files() {
        let dir = tempdir().unwrap();
        let first = write_text_page(dir.path());
        let second = dir.path().join("tweede.html");
        fs::write(&second, "<html><body><p>Tweede pagina.</p></body></html>").unwrap();
        let mut store = DocumentStore::new();

        let snippets = snippets::scan(&mut store, &[first, second.clone()]);
        let ids: Vec<usize> = snippets.iter().map(|s| s.id).collect();
        assert_eq!(ids, (0..snippets.len()).collect::<Vec<_>>());
        assert_eq!(snippets.last().unwrap().file, second);
        assert_eq!(snippets.last().unwrap().display_text, "Tweede pagina.");
    }

    #[test]
    fn test_scan_truncates_long_display_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lang.html");
        let body = format!("<html><body><p>{}</p></body></html>", "volzin ".repeat(40));
        fs::write(&path, body).unwrap();
        let mut store = DocumentStore::new();

        let snippets = snippets::scan(&mut store, &[path]);
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].display_text.ends_with("..."));
        assert_eq!(snippets[0].display_text.chars().count(), 103);
        assert!(snippets[0].original_text.len() > 200);
    }
}

mod editing {
    use super::*;

    #[test]
    fn test_edit_rewrites_text_in_place() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let mut snippets = snippets::scan(&mut store, &[path.clone()]);
        snippets::edit(&mut store, &mut snippets[2], "Opgericht in 1953.").unwrap();
        assert_eq!(snippets[2].original_text, "Opgericht in 1953.");

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("<p>Opgericht in 1953.</p>"));
        assert!(!written.contains("1954"));
        // Everything else survives byte-for-byte.
        assert!(written.contains("<!-- redactie: intro niet weghalen -->"));
        assert!(written.contains("Train mee op dinsdag &amp; donderdag."));
    }

    #[test]
    fn test_text_edit_keeps_other_handles_valid() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let mut snippets = snippets::scan(&mut store, &[path.clone()]);
        snippets::edit(&mut store, &mut snippets[1], "Over onze club").unwrap();
        // A text replacement is not structural, so a second snippet's handle
        // still resolves.
        snippets::edit(&mut store, &mut snippets[2], "Opgericht in 1953.").unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("<h1>Over onze club</h1>"));
        assert!(written.contains("<p>Opgericht in 1953.</p>"));
    }

    #[test]
    fn test_delete_parent_removes_element() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let snippets = snippets::scan(&mut store, &[path.clone()]);
        let removed = snippets::delete_parent(&mut store, &snippets[2]).unwrap();
        assert_eq!(removed, "p");

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("Opgericht in 1954."));
        assert!(written.contains("<h1>Over de club</h1>"));
    }

    #[test]
    fn test_delete_parent_refuses_protected_element() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let snippets = snippets::scan(&mut store, &[path.clone()]);
        // "Losse tekst onder body." sits directly under <body>.
        let loose = snippets.last().unwrap();
        let err = snippets::delete_parent(&mut store, loose).unwrap_err();
        assert!(matches!(err, Error::ProtectedElement(ref name) if name == "body"));
        // Nothing was written.
        assert_eq!(fs::read_to_string(&path).unwrap(), TEXT_PAGE);
    }

    #[test]
    fn test_structural_edit_invalidates_handles() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let mut snippets = snippets::scan(&mut store, &[path.clone()]);
        snippets::delete_parent(&mut store, &snippets[1]).unwrap();

        let err = snippets::edit(&mut store, &mut snippets[2], "maakt niet uit").unwrap_err();
        assert!(matches!(err, Error::StaleNode));

        // A rescan issues fresh handles that work again.
        let mut rescanned = snippets::scan(&mut store, &[path]);
        let target = rescanned.iter().position(|s| s.original_text == "Opgericht in 1954.").unwrap();
        snippets::edit(&mut store, &mut rescanned[target], "Opgericht in 1953.").unwrap();
    }
}

mod inserting {
    use super::*;

    #[test]
    fn test_insert_paragraph_after() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let snippets = snippets::scan(&mut store, &[path.clone()]);
        snippets::insert_adjacent(
            &mut store,
            &snippets[2],
            "p",
            "Aangesloten bij de Atletiekunie.",
            InsertPosition::After,
        )
        .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("<p>Aangesloten bij de Atletiekunie.</p>"));
        let old = written.find("Opgericht in 1954.").unwrap();
        let new = written.find("Aangesloten").unwrap();
        assert!(old < new);
    }

    #[test]
    fn test_insert_heading_before() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let snippets = snippets::scan(&mut store, &[path.clone()]);
        snippets::insert_adjacent(&mut store, &snippets[2], "h2", "Historie", InsertPosition::Before)
            .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let heading = written.find("<h2>Historie</h2>").unwrap();
        let paragraph = written.find("<p>Opgericht in 1954.</p>").unwrap();
        assert!(heading < paragraph);
    }

    #[test]
    fn test_insert_rejects_disallowed_tag() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let snippets = snippets::scan(&mut store, &[path.clone()]);
        let err = snippets::insert_adjacent(
            &mut store,
            &snippets[2],
            "script",
            "alert(1)",
            InsertPosition::After,
        )
        .unwrap_err();
        assert!(matches!(err, Error::TagNotAllowed(ref tag) if tag == "script"));
        assert_eq!(fs::read_to_string(&path).unwrap(), TEXT_PAGE);
    }

    #[test]
    fn test_inserted_text_is_escaped() {
        let dir = tempdir().unwrap();
        let path = write_text_page(dir.path());
        let mut store = DocumentStore::new();

        let snippets = snippets::scan(&mut store, &[path.clone()]);
        snippets::insert_adjacent(
            &mut store,
            &snippets[2],
            "p",
            "Snelste tijd < 11s & stijgend",
            InsertPosition::After,
        )
        .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("<p>Snelste tijd &lt; 11s &amp; stijgend</p>"));
    }
}
