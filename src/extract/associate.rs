//! Category/item association across snapshots.
//!
//! Headers and item lists are siblings in the rendered list, so an item
//! belongs to the most recent header seen before it in page order. That
//! "current category" pointer survives from one snapshot to the next: the
//! window that reveals an item may no longer contain its header.
//!
//! Each snapshot is processed twice:
//!
//! 1. **Window pass**: the direct indexed children of the virtualized list,
//!    which is exactly the slice of the menu currently rendered.
//! 2. **Document pass**: every header and item anywhere in the snapshot, in
//!    document order, to catch rows rendered outside the list (sticky
//!    headers, overscan).
//!
//! Re-rendered items are filtered by a per-run set of identity keys.

use super::item::parse_item;
use super::markers;
use super::{ITEM_SELECTOR, element_text, is_loading_placeholder, selector};
use crate::models::{MenuCatalog, MenuItem};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, trace};

static VIRTUAL_LIST: Lazy<Selector> = Lazy::new(|| selector(markers::VIRTUAL_LIST));
static STYLED_DIV: Lazy<Selector> = Lazy::new(|| selector("div[style]"));
static SECTION_TITLE: Lazy<Selector> = Lazy::new(|| selector(markers::SECTION_TITLE));
static ELEMENT_WITH_ID: Lazy<Selector> = Lazy::new(|| selector("[id]"));
static H3: Lazy<Selector> = Lazy::new(|| selector("h3"));
static ITEMS_CONTAINER: Lazy<Selector> = Lazy::new(|| selector(markers::ITEMS_CONTAINER));
static TITLE_OR_ITEM: Lazy<Selector> =
    Lazy::new(|| selector(&format!("{}, {}", markers::SECTION_TITLE, markers::ITEM)));

/// Inline style of a windowed list: padding stands in for evicted rows.
static WINDOW_PADDING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"padding-top.*padding-bottom").unwrap());
static SECTION_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"menuSection\d+").unwrap());

/// What one snapshot contributed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub window_found: bool,
    pub indexed_children: usize,
    pub items_added: usize,
}

/// Running state of one extraction run.
///
/// Owned by a single session and discarded with it.
#[derive(Debug, Default)]
pub struct Association {
    catalog: MenuCatalog,
    seen: HashSet<String>,
    current: Option<String>,
}

impl Association {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one snapshot: window pass, then document pass.
    pub fn observe(&mut self, markup: &str) -> Observation {
        let document = Html::parse_document(markup);
        let carried = self.current.clone();

        let mut observation = self.window_pass(&document);
        let after_window = self.current.clone();

        self.current = carried;
        observation.items_added += self.document_pass(&document);

        if observation.window_found {
            self.current = after_window;
        }
        trace!(?observation, current = ?self.current, "Snapshot merged");
        observation
    }

    /// Merge only the rendered window of one snapshot.
    pub fn observe_window_only(&mut self, markup: &str) -> Observation {
        let document = Html::parse_document(markup);
        self.window_pass(&document)
    }

    pub fn catalog(&self) -> &MenuCatalog {
        &self.catalog
    }

    #[cfg(test)]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Finish the run, dropping categories that never received an item.
    pub fn finish(self) -> MenuCatalog {
        let mut catalog = self.catalog;
        catalog.prune_empty();
        catalog
    }

    fn window_pass(&mut self, document: &Html) -> Observation {
        let Some(list) = find_window(document) else {
            return Observation::default();
        };

        let mut observation = Observation {
            window_found: true,
            ..Default::default()
        };
        for row in indexed_children(list) {
            observation.indexed_children += 1;
            if let Some(title) = section_title(row) {
                self.enter_category(title);
            }
            if let Some(container) = row.select(&ITEMS_CONTAINER).next() {
                for fragment in container.select(&ITEM_SELECTOR) {
                    if is_loading_placeholder(fragment) {
                        continue;
                    }
                    if let Some(item) = parse_item(fragment) {
                        observation.items_added += usize::from(self.accept(item));
                    }
                }
            }
        }
        observation
    }

    fn document_pass(&mut self, document: &Html) -> usize {
        let mut added = 0;
        for element in document.select(&TITLE_OR_ITEM) {
            if element.value().name() == "h3" {
                if let Some(title) = element_text(element) {
                    self.enter_category(title);
                }
            } else if !is_loading_placeholder(element) {
                if let Some(item) = parse_item(element) {
                    added += usize::from(self.accept(item));
                }
            }
        }
        added
    }

    fn enter_category(&mut self, title: String) {
        if self.catalog.get(&title).is_none() {
            debug!(category = %title, "Found category");
        }
        self.catalog.ensure_category(&title);
        self.current = Some(title);
    }

    /// Add `item` to the current category unless already captured.
    ///
    /// Items seen before any header are dropped without being recorded, so a
    /// later snapshot that shows their header can still claim them.
    fn accept(&mut self, item: MenuItem) -> bool {
        let Some(current) = self.current.as_deref() else {
            trace!(item = %item.name, "Item before any category; dropped");
            return false;
        };
        if !self.seen.insert(item.identity_key().to_string()) {
            return false;
        }
        let category = self.catalog.ensure_category(current);
        if category.contains_name(&item.name) {
            return false;
        }
        category.items.push(item);
        true
    }
}

/// The virtualized list container, by test marker or by its padding style.
fn find_window(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&VIRTUAL_LIST).next().or_else(|| {
        document.select(&STYLED_DIV).find(|div| {
            div.value()
                .attr("style")
                .is_some_and(|style| WINDOW_PADDING_RE.is_match(style))
        })
    })
}

/// Direct `div` children of the list that carry a `data-index`.
fn indexed_children(list: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    list.children().filter_map(ElementRef::wrap).filter(|child| {
        child.value().name() == "div" && child.value().attr("data-index").is_some()
    })
}

/// Header text of a row: the marked title, or an `h3` inside a `menuSectionN` block.
fn section_title(row: ElementRef<'_>) -> Option<String> {
    if let Some(title) = row.select(&SECTION_TITLE).find_map(element_text) {
        return Some(title);
    }
    row.select(&ELEMENT_WITH_ID)
        .filter(|el| el.value().id().is_some_and(|id| SECTION_ID_RE.is_match(id)))
        .find_map(|section| section.select(&H3).find_map(element_text))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Markup builders for virtualized menu snapshots.

    pub enum Row<'a> {
        Header(&'a str),
        Items(&'a [(&'a str, &'a str)]),
    }

    /// One rendered row: a section header or an item list of `(id, name)`.
    pub fn row(index: usize, row: &Row<'_>) -> String {
        match row {
            Row::Header(title) => format!(
                r#"<div data-index="{index}"><div id="menuSection{index}"><h3 data-testid="menuSection-title">{title}</h3></div></div>"#
            ),
            Row::Items(items) => {
                let articles: String = items
                    .iter()
                    .map(|(id, name)| {
                        format!(
                            r#"<div id="{id}"><article data-testid="restaurant-menu-item"><h6 data-testid="menu-item-name">{name}</h6><span data-testid="menu-item-price">$5.00</span></article></div>"#
                        )
                    })
                    .collect();
                format!(
                    r#"<div data-index="{index}"><div data-testid="menu-items-container">{articles}</div></div>"#
                )
            }
        }
    }

    /// A snapshot whose virtualized list renders `rows`, starting at `first_index`.
    pub fn window(first_index: usize, rows: &[Row<'_>]) -> String {
        let body: String = rows
            .iter()
            .enumerate()
            .map(|(offset, r)| row(first_index + offset, r))
            .collect();
        format!(
            r#"<html><body><main><div data-test-id="virtuoso-item-list" style="padding-top: 0px; padding-bottom: 900px">{body}</div></main></body></html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{Row, window};
    use super::*;

    fn names(catalog: &MenuCatalog, category: &str) -> Vec<String> {
        catalog
            .get(category)
            .map(|c| c.items.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_items_follow_preceding_header() {
        let snapshot = window(
            0,
            &[
                Row::Header("Mains"),
                Row::Items(&[("Item1", "Burger"), ("Item2", "Pasta")]),
                Row::Header("Drinks"),
                Row::Items(&[("Item3", "Cola")]),
            ],
        );
        let mut association = Association::new();
        let observation = association.observe(&snapshot);
        assert!(observation.window_found);
        assert_eq!(observation.indexed_children, 4);
        assert_eq!(observation.items_added, 3);

        let catalog = association.finish();
        assert_eq!(catalog.category_names(), vec!["Mains", "Drinks"]);
        assert_eq!(names(&catalog, "Mains"), vec!["Burger", "Pasta"]);
        assert_eq!(names(&catalog, "Drinks"), vec!["Cola"]);
    }

    #[test]
    fn test_same_snapshot_twice_is_idempotent() {
        let snapshot = window(
            0,
            &[Row::Header("Mains"), Row::Items(&[("Item1", "Burger"), ("Item2", "Pasta")])],
        );
        let mut association = Association::new();
        association.observe(&snapshot);
        let before = association.catalog().clone();

        let second = association.observe(&snapshot);
        assert_eq!(second.items_added, 0);
        assert_eq!(association.catalog(), &before);
        assert_eq!(association.seen_count(), 2);
    }

    #[test]
    fn test_item_in_three_overlapping_windows_kept_once() {
        let frames = [
            window(0, &[Row::Header("Mains"), Row::Items(&[("Item1", "Burger"), ("Item9", "X")])]),
            window(1, &[Row::Items(&[("Item1", "Burger"), ("Item9", "X")]), Row::Items(&[("Item2", "Pasta")])]),
            window(1, &[Row::Items(&[("Item9", "X")]), Row::Items(&[("Item2", "Pasta"), ("Item3", "Steak")])]),
        ];
        let mut association = Association::new();
        for frame in &frames {
            association.observe(frame);
        }
        let catalog = association.finish();
        assert_eq!(names(&catalog, "Mains"), vec!["Burger", "X", "Pasta", "Steak"]);
        let x_count = catalog.categories().iter().flat_map(|c| &c.items).filter(|i| i.name == "X").count();
        assert_eq!(x_count, 1);
    }

    #[test]
    fn test_header_carries_across_snapshot_boundary() {
        // "Drinks" header is the last row of the first window; its items only
        // render in the next window, after the header has been evicted.
        let first = window(0, &[Row::Header("Mains"), Row::Items(&[("Item1", "Burger")]), Row::Header("Drinks")]);
        let second = window(3, &[Row::Items(&[("Item5", "Lemonade"), ("Item6", "Iced Tea")])]);

        let mut association = Association::new();
        association.observe(&first);
        association.observe(&second);
        let catalog = association.finish();

        assert_eq!(names(&catalog, "Mains"), vec!["Burger"]);
        assert_eq!(names(&catalog, "Drinks"), vec!["Lemonade", "Iced Tea"]);
    }

    #[test]
    fn test_category_order_is_first_appearance() {
        let frames = [
            window(0, &[Row::Header("Mains"), Row::Items(&[("Item1", "Burger")])]),
            window(2, &[Row::Header("Drinks"), Row::Items(&[("Item2", "Cola")])]),
            window(0, &[Row::Header("Mains"), Row::Items(&[("Item1", "Burger")])]),
            window(4, &[Row::Header("Desserts"), Row::Items(&[("Item3", "Pie")])]),
        ];
        let mut association = Association::new();
        for frame in &frames {
            association.observe(frame);
        }
        assert_eq!(association.finish().category_names(), vec!["Mains", "Drinks", "Desserts"]);
    }

    #[test]
    fn test_items_before_any_header_are_dropped_then_claimable() {
        let orphan = window(5, &[Row::Items(&[("Item7", "Fries")])]);
        let with_header = window(4, &[Row::Header("Sides"), Row::Items(&[("Item7", "Fries")])]);

        let mut association = Association::new();
        assert_eq!(association.observe(&orphan).items_added, 0);
        association.observe(&with_header);
        assert_eq!(names(&association.finish(), "Sides"), vec!["Fries"]);
    }

    #[test]
    fn test_empty_categories_are_pruned() {
        let snapshot = window(0, &[Row::Header("Specials"), Row::Header("Mains"), Row::Items(&[("Item1", "Burger")])]);
        let mut association = Association::new();
        association.observe(&snapshot);
        assert_eq!(association.catalog().len(), 2);
        assert_eq!(association.finish().category_names(), vec!["Mains"]);
    }

    #[test]
    fn test_same_name_in_two_categories_is_kept() {
        let snapshot = window(
            0,
            &[
                Row::Header("Lunch"),
                Row::Items(&[("Item1", "Club Sandwich")]),
                Row::Header("Dinner"),
                Row::Items(&[("Item2", "Club Sandwich")]),
            ],
        );
        let mut association = Association::new();
        association.observe(&snapshot);
        let catalog = association.finish();
        assert_eq!(names(&catalog, "Lunch"), vec!["Club Sandwich"]);
        assert_eq!(names(&catalog, "Dinner"), vec!["Club Sandwich"]);
    }

    #[test]
    fn test_placeholders_are_skipped() {
        let snapshot = r#"<div data-test-id="virtuoso-item-list">
            <div data-index="0"><h3 data-testid="menuSection-title">Mains</h3></div>
            <div data-index="1"><div data-testid="menu-items-container">
              <article data-testid="restaurant-menu-item" class="menuItem stencil-row"><h6>Loading</h6></article>
              <article data-testid="restaurant-menu-item"><h6>Burger</h6></article>
            </div></div></div>"#;
        let mut association = Association::new();
        association.observe(snapshot);
        assert_eq!(names(&association.finish(), "Mains"), vec!["Burger"]);
    }

    #[test]
    fn test_padding_styled_container_is_found() {
        let snapshot = r#"<div style="box-sizing: border-box; padding-top: 1200px; padding-bottom: 300px;">
            <div data-index="7"><div id="menuSection7"><h3>Salads</h3></div></div>
            <div data-index="8"><div data-testid="menu-items-container">
              <article data-testid="restaurant-menu-item"><h6>Greek</h6></article>
            </div></div></div>"#;
        let mut association = Association::new();
        let observation = association.observe_window_only(snapshot);
        assert!(observation.window_found);
        assert_eq!(names(&association.finish(), "Salads"), vec!["Greek"]);
    }

    #[test]
    fn test_document_pass_catches_items_outside_window() {
        let snapshot = r#"<html><body>
            <h3 data-testid="menuSection-title">Popular</h3>
            <article data-testid="restaurant-menu-item"><h6>Wings</h6></article>
            <div data-test-id="virtuoso-item-list">
              <div data-index="3"><h3 data-testid="menuSection-title">Mains</h3></div>
              <div data-index="4"><div data-testid="menu-items-container">
                <article data-testid="restaurant-menu-item"><h6>Burger</h6></article>
              </div></div>
            </div></body></html>"#;
        let mut association = Association::new();
        association.observe(snapshot);
        let catalog = association.finish();
        assert_eq!(catalog.category_names(), vec!["Mains", "Popular"]);
        assert_eq!(names(&catalog, "Popular"), vec!["Wings"]);
        assert_eq!(names(&catalog, "Mains"), vec!["Burger"]);
    }

    #[test]
    fn test_window_only_ignores_rows_outside_list() {
        let snapshot = r#"<html><body>
            <h3 data-testid="menuSection-title">Popular</h3>
            <article data-testid="restaurant-menu-item"><h6>Wings</h6></article>
            </body></html>"#;
        let mut association = Association::new();
        let observation = association.observe_window_only(snapshot);
        assert!(!observation.window_found);
        assert!(association.finish().is_empty());
    }
}
