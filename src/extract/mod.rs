//! Menu and restaurant extraction from rendered page markup.
//!
//! The target pages render their menu as a virtualized list: only a window of
//! rows exists in the document tree at any time. Extraction therefore works
//! on a series of snapshots and merges what each one proves to exist.
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`item`] | Parse one item fragment into a [`MenuItem`](crate::models::MenuItem) |
//! | [`associate`] | Assign items to the most recent category header across snapshots |
//! | [`scroll`] | Drive the viewport through the page and feed snapshots to the associator |
//! | [`strategies`] | Ordered fallback chain producing the final catalog |
//! | [`metadata`] | Read embedded `application/ld+json` blocks |
//! | [`business`] | Restaurant-level attributes from a static snapshot |

pub mod associate;
pub mod business;
pub mod item;
pub mod metadata;
pub mod scroll;
pub mod strategies;

use crate::utils::normalize_text;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

/// Attribute markers used by the restaurant pages.
pub(crate) mod markers {
    pub const ITEM: &str = "article[data-testid='restaurant-menu-item']";
    pub const SECTION_TITLE: &str = "h3[data-testid='menuSection-title']";
    pub const ITEMS_CONTAINER: &str = "div[data-testid='menu-items-container']";
    pub const VIRTUAL_LIST: &str = "div[data-test-id='virtuoso-item-list']";
    /// Class fragment carried by skeleton rows that are still loading.
    pub const LOADING_PLACEHOLDER: &str = "stencil";
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

pub(crate) static ITEM_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(markers::ITEM));

/// Whitespace-normalized text of an element, `None` when empty.
pub(crate) fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = normalize_text(&element.text().collect::<Vec<_>>().join(" "));
    (!text.is_empty()).then_some(text)
}

/// Whether an item fragment is a loading skeleton rather than real content.
pub(crate) fn is_loading_placeholder(element: ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| class.contains(markers::LOADING_PLACEHOLDER))
}
