//! Ordered fallback chain for menu extraction.
//!
//! | Order | Strategy | Source |
//! |-------|----------|--------|
//! | 1 | [`Strategy::ScrollDriven`] | Live page, scrolled step by step |
//! | 2 | [`Strategy::PageState`] | In-memory objects of the page's scripts |
//! | 3 | [`Strategy::StructuredMetadata`] | `application/ld+json` blocks |
//! | 4 | [`Strategy::StaticDom`] | One static snapshot, rendered window only |
//!
//! The first strategy whose catalog holds at least one item wins. A script
//! error inside a strategy counts as "found nothing"; a session failure ends
//! the chain.

use super::associate::Association;
use super::metadata;
use super::scroll::collect_by_scrolling;
use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::models::{MenuCatalog, MenuItem};
use crate::snapshot::SnapshotProvider;
use crate::utils::truncate_for_log;
use scraper::Html;
use serde_json::Value;
use std::fmt;
use tracing::{info, instrument, warn};

/// Searches `window` globals, then React roots, for a menu-shaped object.
///
/// The result is JSON round-tripped inside the page so cyclic object graphs
/// come back as `null` instead of failing the evaluation.
pub const PAGE_STATE_SCRIPT: &str = r#"(() => {
  const plain = (val) => { try { return JSON.parse(JSON.stringify(val)); } catch (e) { return null; } };
  for (const key in window) {
    if (key.includes('menu') || key.includes('Menu') || key.includes('restaurant')) {
      let val;
      try { val = window[key]; } catch (e) { continue; }
      if (val && typeof val === 'object' && (val.menu || val.menuSections || val.categories)) {
        const copy = plain({ menu: val.menu, menuSections: val.menuSections, categories: val.categories });
        if (copy) { return copy; }
      }
    }
  }
  for (const elem of document.querySelectorAll('[data-reactroot]')) {
    const reactKey = Object.keys(elem).find((k) => k.startsWith('__react'));
    if (reactKey && elem[reactKey] && elem[reactKey].memoizedProps) {
      const props = elem[reactKey].memoizedProps;
      const copy = plain({ menu: props.menu, menuSections: props.menuSections, categories: props.categories });
      if (copy) { return copy; }
    }
  }
  return null;
})()"#;

/// One way of producing a [`MenuCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ScrollDriven,
    PageState,
    StructuredMetadata,
    StaticDom,
}

impl Strategy {
    /// Priority order of the chain.
    pub const ORDER: [Strategy; 4] = [
        Strategy::ScrollDriven,
        Strategy::PageState,
        Strategy::StructuredMetadata,
        Strategy::StaticDom,
    ];

    /// Run this strategy. `static_markup` is a snapshot taken before the chain started.
    pub async fn run<P: SnapshotProvider>(
        self,
        page: &mut P,
        static_markup: &str,
        config: &ScrapeConfig,
    ) -> Result<MenuCatalog, ScrapeError> {
        match self {
            Strategy::ScrollDriven => collect_by_scrolling(page, config).await,
            Strategy::PageState => {
                let state = page.evaluate(PAGE_STATE_SCRIPT).await?;
                Ok(menu_from_page_state(&state))
            }
            Strategy::StructuredMetadata => {
                let document = Html::parse_document(static_markup);
                Ok(metadata::menu_from_records(&metadata::records(&document)))
            }
            Strategy::StaticDom => {
                let mut association = Association::new();
                association.observe_window_only(static_markup);
                Ok(association.finish())
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::ScrollDriven => "scroll-driven",
            Strategy::PageState => "page-state",
            Strategy::StructuredMetadata => "structured-metadata",
            Strategy::StaticDom => "static-dom",
        };
        f.write_str(name)
    }
}

/// Run the chain, stopping at the first strategy that finds an item.
///
/// # Arguments
///
/// * `page` - The live page, used by the scroll-driven and page-state strategies
/// * `static_markup` - Snapshot taken before the chain started
/// * `config` - Scroll and wait tuning
///
/// # Returns
///
/// The winning strategy and its catalog, or `None` when every strategy came
/// back empty. Session-level errors end the chain and are returned.
#[instrument(level = "info", skip_all)]
pub async fn extract_menu<P: SnapshotProvider>(
    page: &mut P,
    static_markup: &str,
    config: &ScrapeConfig,
) -> Result<Option<(Strategy, MenuCatalog)>, ScrapeError> {
    for strategy in Strategy::ORDER {
        let catalog = match strategy.run(page, static_markup, config).await {
            Ok(catalog) => catalog,
            Err(e) if e.is_recoverable() => {
                warn!(%strategy, error = %truncate_for_log(&e.to_string(), 300), "Strategy failed; trying next");
                continue;
            }
            Err(e) => return Err(e),
        };
        if catalog.has_items() {
            info!(
                %strategy,
                categories = ?catalog.category_names(),
                items = catalog.total_items(),
                "Menu extracted"
            );
            return Ok(Some((strategy, catalog)));
        }
        info!(%strategy, "Strategy found no menu");
    }
    Ok(None)
}

/// Map a page-state object (`menu`, `menuSections` or `categories` list of
/// named sections with `items`) into a catalog.
pub fn menu_from_page_state(state: &Value) -> MenuCatalog {
    let mut catalog = MenuCatalog::new();
    let Some(sections) = ["menu", "menuSections", "categories"]
        .iter()
        .find_map(|key| state.get(key).and_then(Value::as_array))
    else {
        return catalog;
    };

    for section in sections {
        let Some(name) = metadata::text_field(section, "name") else {
            continue;
        };
        let items: Vec<MenuItem> = section
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(page_state_item).collect())
            .unwrap_or_default();
        if items.is_empty() {
            continue;
        }
        let category = catalog.ensure_category(&name);
        for item in items {
            if !category.contains_name(&item.name) {
                category.items.push(item);
            }
        }
    }
    catalog
}

fn page_state_item(item: &Value) -> Option<MenuItem> {
    let name = metadata::text_field(item, "name")?;
    Some(MenuItem {
        price: metadata::text_field(item, "price"),
        description: metadata::text_field(item, "description"),
        id: metadata::text_field(item, "id"),
        ..MenuItem::named(name)
    })
}
