//! Access to a live, rendered page.
//!
//! The extraction engine never talks to a browser directly. It drives a
//! [`SnapshotProvider`], which can move the viewport, run read-only scripts,
//! and hand back the markup currently in the document tree.
//!
//! # Implementations
//!
//! | Provider | Module | Notes |
//! |----------|--------|-------|
//! | Chromium over CDP | [`chrome`] | One browser process per session |
//! | Scripted frames | `replay` | Test-only, serves canned snapshots by scroll position |

pub mod chrome;
#[cfg(test)]
pub mod replay;

use crate::error::ScrapeError;
use serde_json::Value;

/// A page that can be scrolled, inspected and snapshotted.
///
/// Methods take `&mut self`: a provider belongs to exactly one extraction
/// session and is never shared while that session runs.
pub trait SnapshotProvider {
    /// Load `url` in the page.
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// The markup currently present in the document tree.
    async fn current_markup(&mut self) -> Result<String, ScrapeError>;

    /// Evaluate a script and return its JSON-serializable result.
    ///
    /// `undefined` and non-serializable results come back as `Value::Null`.
    async fn evaluate(&mut self, script: &str) -> Result<Value, ScrapeError>;

    /// Set the vertical scroll offset, in pixels.
    async fn scroll_to(&mut self, position: u64) -> Result<(), ScrapeError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), ScrapeError>;

    /// Current scrollable height of the document, in pixels.
    async fn document_height(&mut self) -> Result<u64, ScrapeError>;
}
