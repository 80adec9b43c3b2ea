//! Utility functions for text cleanup, URL naming, and file system operations.
//!
//! - Whitespace normalization for extracted text
//! - String truncation for logging
//! - Restaurant slugs and trailing path segments for output file names
//! - URL list parsing and output directory validation

use crate::error::ScrapeError;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

static RESTAURANT_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/restaurant/([^/]+)/\d+").unwrap());

const DEFAULT_SLUG: &str = "restaurant";

/// Collapse every run of whitespace to a single space and trim the ends.
///
/// ```ignore
/// assert_eq!(normalize_text("  Pad \n Thai "), "Pad Thai");
/// ```
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (backing off to a character boundary)
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// File-name slug for a restaurant URL.
///
/// Uses the name segment of `/restaurant/<slug>/<id>` paths, else the last
/// non-empty path segment, else `"restaurant"`.
pub fn restaurant_slug(url: &str) -> String {
    if let Some(caps) = RESTAURANT_PATH.captures(url) {
        return caps[1].to_string();
    }
    trailing_segment(url).unwrap_or_else(|| DEFAULT_SLUG.to_string())
}

/// Last non-empty path segment of a URL, if any.
pub fn trailing_segment(url: &str) -> Option<String> {
    let segments: Vec<String> = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .map(|segments| segments.map(str::to_string).collect())
            .unwrap_or_default(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .split('/')
            .map(str::to_string)
            .collect(),
    };
    segments.into_iter().rev().find(|s| !s.is_empty())
}

/// Parse a URL list: one URL per line, blank lines and `#` comments skipped.
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a URL list file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_url_list(path: &Path) -> Result<Vec<String>, ScrapeError> {
    let contents = fs::read_to_string(path).await?;
    let urls = parse_url_list(&contents);
    debug!(count = urls.len(), "Read URL list");
    Ok(urls)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), ScrapeError> {
    fs::create_dir_all(path).await?;
    // Sync probe write; simpler error surface
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Pad \n\t Thai  "), "Pad Thai");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let result = truncate_for_log("crème brûlée", 3);
        assert_eq!(result, "cr…(+13 bytes)");
    }

    #[test]
    fn test_restaurant_slug() {
        assert_eq!(
            restaurant_slug("https://www.grubhub.com/restaurant/joes-pizza-12-main-st/2345678"),
            "joes-pizza-12-main-st"
        );
        assert_eq!(restaurant_slug("https://example.com/menus/noodle-bar/"), "noodle-bar");
        assert_eq!(restaurant_slug("https://example.com/"), "restaurant");
    }

    #[test]
    fn test_trailing_segment() {
        assert_eq!(
            trailing_segment("https://example.com/a/b?x=1").as_deref(),
            Some("b")
        );
        assert_eq!(trailing_segment("not a url/with/tail").as_deref(), Some("tail"));
        assert_eq!(trailing_segment("https://example.com"), None);
    }

    #[test]
    fn test_parse_url_list_skips_comments_and_blanks() {
        let urls = parse_url_list("# batch one\nhttps://a.example/1\n\n  https://b.example/2  \n#https://c.example/3\n");
        assert_eq!(urls, vec!["https://a.example/1", "https://b.example/2"]);
    }

    #[tokio::test]
    async fn test_read_url_list_and_writable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("urls.txt");
        tokio::fs::write(&list, "https://a.example/1\n").await.unwrap();
        assert_eq!(read_url_list(&list).await.unwrap(), vec!["https://a.example/1"]);

        let nested = dir.path().join("out/nested");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
