//! Image reference inventory.
//!
//! Scans the configured pages for `<img>` elements, resolves their `src`
//! attributes against the site root and checks whether the files exist on
//! disk. References carry a live [`NodeHandle`] so an individual `src` can
//! be rewritten in place; the aggregated [`ImageUsage`] view groups
//! references per resolved file for a site-wide overview.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::config;
use crate::dom::NodeHandle;
use crate::error::{Error, Result};
use crate::loader::DocumentStore;
use crate::serializer::escape_attr;

/// One `<img>` occurrence in one HTML file.
#[derive(Debug, Clone)]
pub struct ImageReference {
    /// The HTML file containing the `<img>` element.
    pub html_file: PathBuf,
    /// The `src` attribute as written (site-relative or relative).
    pub src: String,
    /// Live reference to the `<img>` element in the cached tree.
    pub handle: NodeHandle,
    /// The `src` resolved against the site root.
    pub resolved_path: PathBuf,
    /// Whether a regular file exists at the resolved path.
    pub exists: bool,
}

/// Aggregated usage of one image file across the scanned pages.
#[derive(Debug, Clone, Default)]
pub struct ImageUsage {
    /// Number of `<img>` elements referencing the file.
    pub usage_count: usize,
    /// Distinct HTML files the image appears in.
    pub html_files: BTreeSet<PathBuf>,
    /// Distinct `src` spellings that resolve to this file.
    pub sources: BTreeSet<String>,
    /// Whether the file exists on disk.
    pub exists: bool,
}

/// True for `src` values the scan does not track: empty, inline data and
/// absolute remote URLs.
fn is_external_src(src: &str) -> bool {
    src.is_empty()
        || src.starts_with("data:")
        || src.starts_with("http:")
        || src.starts_with("https:")
}

/// Scan files for local image references.
///
/// `<img>` elements without a `src`, with an empty `src` or with an
/// external one (`data:`, `http:`, `https:`) are skipped. Files that fail
/// to parse are logged and skipped.
pub fn scan(config: &config::SiteConfig, store: &mut DocumentStore, files: &[PathBuf]) -> Vec<ImageReference> {
    let mut references = Vec::new();
    for file in files {
        let doc = match store.load(file) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("skipping '{}' in image scan: {}", file.display(), e);
                continue;
            }
        };
        let root = doc.root();
        for img in doc.find_all_elements(root, |el| el.name == "img") {
            let Some(src) = doc.attr_of(img, "src") else { continue };
            if is_external_src(&src) {
                continue;
            }
            let resolved_path = config::resolve_site_path(&config.site_root, &src);
            let exists = resolved_path.is_file();
            references.push(ImageReference {
                html_file: file.clone(),
                src,
                handle: doc.handle(img),
                resolved_path,
                exists,
            });
        }
    }
    references
}

/// Group references per resolved file, in path order.
pub fn aggregate(references: &[ImageReference]) -> BTreeMap<PathBuf, ImageUsage> {
    let mut usage: BTreeMap<PathBuf, ImageUsage> = BTreeMap::new();
    for reference in references {
        let entry = usage.entry(reference.resolved_path.clone()).or_default();
        entry.usage_count += 1;
        entry.html_files.insert(reference.html_file.clone());
        entry.sources.insert(reference.src.clone());
        entry.exists |= reference.exists;
    }
    usage
}

/// Rewrite a reference's `src` attribute and flush its document.
///
/// Attribute edits are not structural, so other handles into the document
/// stay valid. On success the reference's stored fields are refreshed.
pub fn set_src(
    config: &config::SiteConfig,
    store: &mut DocumentStore,
    reference: &mut ImageReference,
    new_src: &str,
) -> Result<()> {
    let doc = store.get_mut(&reference.html_file)?;
    let img = doc.resolve(reference.handle)?;
    match doc.element_mut(img) {
        Some(el) => el.set_attr("src", escape_attr(new_src)),
        None => return Err(Error::StaleNode),
    }
    store.flush(&reference.html_file)?;
    reference.src = new_src.to_string();
    reference.resolved_path = config::resolve_site_path(&config.site_root, new_src);
    reference.exists = reference.resolved_path.is_file();
    Ok(())
}
