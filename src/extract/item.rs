//! Item fragment parsing.
//!
//! Turns one `article` fragment of the menu into a [`MenuItem`]. A fragment
//! without a recognizable title is not an item; every other field is
//! optional and silently left out when it cannot be found.

use super::{element_text, selector};
use crate::models::MenuItem;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

/// `$` amount with optional thousands separators, decimals and a trailing `+`.
static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\d[\d,]*(?:\.\d+)?\+?").unwrap());
static ITEM_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Item\d+").unwrap());

static TITLE_MARKED: Lazy<Selector> = Lazy::new(|| selector("h6[data-testid]"));
static TITLE_ANY: Lazy<Selector> = Lazy::new(|| selector("h6"));
static PRICE_MARKED: Lazy<Selector> = Lazy::new(|| selector("[data-testid='menu-item-price']"));
static PRICE_ITEMPROP: Lazy<Selector> = Lazy::new(|| selector("span[itemprop='price']"));
static DESCRIPTION_MARKED: Lazy<Selector> =
    Lazy::new(|| selector("[data-testid='menu-item-description']"));
static ANY_ELEMENT: Lazy<Selector> = Lazy::new(|| selector("*"));
static IMAGE_WITH_ALT: Lazy<Selector> = Lazy::new(|| selector("img[alt]"));

/// Marker found in the `src` of images that have not loaded yet.
const LAZY_IMAGE_MARKER: &str = "lazy";

/// Parse a single item fragment.
///
/// # Arguments
///
/// * `fragment` - An `article[data-testid='restaurant-menu-item']` element
///
/// # Returns
///
/// The parsed [`MenuItem`], or `None` when no title can be found; callers
/// skip such fragments.
pub fn parse_item(fragment: ElementRef<'_>) -> Option<MenuItem> {
    let name = fragment
        .select(&TITLE_MARKED)
        .chain(fragment.select(&TITLE_ANY))
        .find_map(element_text)?;

    Some(MenuItem {
        price: find_price(fragment),
        description: find_description(fragment),
        image_url: find_image(fragment),
        id: find_item_id(fragment),
        name,
    })
}

/// First currency amount in `text`, e.g. `"$12.50+"` out of `"Burger $12.50+"`.
pub fn find_currency(text: &str) -> Option<String> {
    CURRENCY_RE.find(text).map(|m| m.as_str().to_string())
}

fn find_price(fragment: ElementRef<'_>) -> Option<String> {
    let marked = fragment
        .select(&PRICE_MARKED)
        .next()
        .or_else(|| fragment.select(&PRICE_ITEMPROP).next())
        .and_then(element_text);

    match marked {
        // Marker wins even without an amount ("Market price")
        Some(text) => Some(find_currency(&text).unwrap_or(text)),
        None => element_text(fragment).as_deref().and_then(find_currency),
    }
}

fn find_description(fragment: ElementRef<'_>) -> Option<String> {
    if let Some(text) = fragment.select(&DESCRIPTION_MARKED).find_map(element_text) {
        return Some(text);
    }
    fragment
        .select(&ANY_ELEMENT)
        .filter(|el| {
            let value = el.value();
            ["class", "style"].iter().any(|attr| {
                value
                    .attr(attr)
                    .is_some_and(|v| v.to_ascii_lowercase().contains("description"))
            })
        })
        .find_map(element_text)
}

fn find_image(fragment: ElementRef<'_>) -> Option<String> {
    fragment
        .select(&IMAGE_WITH_ALT)
        .filter(|img| img.value().attr("alt").is_some_and(|alt| !alt.trim().is_empty()))
        .find_map(|img| {
            let src = img.value().attr("src")?.trim();
            let usable = !src.is_empty() && !src.starts_with("data:") && !src.contains(LAZY_IMAGE_MARKER);
            usable.then(|| src.to_string())
        })
}

fn find_item_id(fragment: ElementRef<'_>) -> Option<String> {
    fragment
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter_map(|el| el.value().id())
        .find(|id| ITEM_ID_RE.is_match(id))
        .map(str::to_string)
}
