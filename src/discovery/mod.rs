//! Orphan discovery over the markdown content tree.
//!
//! A page is published when its source contains `publish: true`. Wikilinks
//! (`[[Target]]` or `[[Target#anchor]]`) between published pages form a
//! backlink graph; a published page nobody links to is an orphan. `index.md`
//! is the site root and is never reported.
//!
//! Reads are best effort: a file that cannot be read is skipped, not fatal.

use regex::Regex;
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::{Path, PathBuf},
};
use tracing::warn;

/// Frontmatter fields surfaced in the orphan report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub tags: Vec<String>,
    pub date: Option<String>,
}

/// Relative paths of published pages with no incoming wikilinks, sorted.
/// A missing or empty content directory yields an empty list.
#[must_use]
pub fn find_orphaned_pages(content_dir: &Path) -> Vec<String> {
    let pages = read_published_pages(content_dir);
    if pages.is_empty() {
        return Vec::new();
    }

    let mut titles: HashMap<String, PathBuf> = HashMap::new();
    for (path, content) in &pages {
        if let Some(title) = capture(content, r"title:\s*([^\n]+)") {
            titles.insert(title, path.clone());
        }
    }

    let wikilink = match Regex::new(r"\[\[([^\]]+)\]\]") {
        Ok(regex) => regex,
        Err(err) => {
            warn!("Invalid wikilink pattern: {err}");
            return Vec::new();
        }
    };

    let mut linked: HashSet<PathBuf> = HashSet::new();
    for (path, content) in &pages {
        for capture in wikilink.captures_iter(content) {
            let Some(link) = capture.get(1) else { continue };
            // Anchors point inside a page; only the page name resolves.
            let name = link.as_str().split('#').next().unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let target = resolve_link(name, &titles, &pages);
            if let Some(target) = target {
                if &target != path {
                    linked.insert(target);
                }
            }
        }
    }

    let mut orphans: Vec<String> = pages
        .keys()
        .filter(|path| {
            path.file_name()
                .map_or(true, |name| name != std::ffi::OsStr::new("index.md"))
                && !linked.contains(*path)
        })
        .filter_map(|path| relative_string(path, content_dir))
        .collect();
    orphans.sort();
    orphans
}

/// Frontmatter metadata for every published page, keyed by relative path.
#[must_use]
pub fn page_metadata(content_dir: &Path) -> BTreeMap<String, PageMeta> {
    let mut metadata = BTreeMap::new();
    for (path, content) in read_published_pages(content_dir) {
        let title = capture(&content, r"title:\s*([^\n]+)").unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let tags = capture(&content, r"(?s)tags:\s*\[(.*?)\]")
            .map(|raw| {
                raw.split(',')
                    .map(|tag| tag.trim().trim_matches(|ch| ch == '"' || ch == '\'').to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let date = capture(&content, r"date:\s*([^\n]+)");

        if let Some(rel) = relative_string(&path, content_dir) {
            metadata.insert(rel, PageMeta { title, tags, date });
        }
    }
    metadata
}

/// Published markdown files under `dir`, with their contents.
fn read_published_pages(dir: &Path) -> BTreeMap<PathBuf, String> {
    let mut pages = BTreeMap::new();
    collect_markdown(dir, &mut pages);
    pages
}

fn collect_markdown(dir: &Path, pages: &mut BTreeMap<PathBuf, String>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if dir.exists() {
                warn!(dir = %dir.display(), "Failed to read content directory: {err}");
            }
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_markdown(&path, pages);
        } else if path.extension().is_some_and(|ext| ext == "md") {
            match std::fs::read_to_string(&path) {
                Ok(content) if content.contains("publish: true") => {
                    pages.insert(path, content);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(file = %path.display(), "Failed to read page: {err}");
                }
            }
        }
    }
}

/// Resolve a wikilink name: exact frontmatter title first, then
/// case-insensitive file stem.
fn resolve_link(
    name: &str,
    titles: &HashMap<String, PathBuf>,
    pages: &BTreeMap<PathBuf, String>,
) -> Option<PathBuf> {
    if let Some(path) = titles.get(name) {
        return Some(path.clone());
    }
    let lowered = name.to_lowercase();
    pages
        .keys()
        .find(|path| {
            path.file_stem()
                .is_some_and(|stem| stem.to_string_lossy().to_lowercase() == lowered)
        })
        .cloned()
}

fn capture(content: &str, pattern: &str) -> Option<String> {
    let regex = Regex::new(pattern).ok()?;
    let capture = regex.captures(content)?;
    Some(capture.get(1)?.as_str().trim().to_string())
}

fn relative_string(path: &Path, base: &Path) -> Option<String> {
    path.strip_prefix(base)
        .ok()
        .map(|rel| rel.to_string_lossy().into_owned())
}
