//! Data models for restaurant pages and their extracted menus.
//!
//! This module defines the core data structures used throughout the application:
//! - [`MenuItem`]: One dish as parsed from a single item fragment
//! - [`MenuCatalog`]: Ordered mapping of category name to its items
//! - [`BusinessInfo`]: Restaurant-level attributes (address, hours, reviews, ...)
//! - [`RestaurantRecord`]: The JSON record written once per scraped page
//!
//! Optional fields are omitted from the JSON output rather than written as
//! `null`, so downstream consumers can test for key presence.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single menu item.
///
/// Only `name` is mandatory; every other attribute is best-effort and may be
/// missing depending on which extraction strategy produced the item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MenuItem {
    /// Display name of the item, never empty.
    pub name: String,
    /// Price as displayed, e.g. `"$12.50"` or `"$8+"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Page-scoped identity token (e.g. `Item12345`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MenuItem {
    /// Create an item carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: None,
            description: None,
            image_url: None,
            id: None,
        }
    }

    /// The key used for deduplication: the item id when present, else the name.
    pub fn identity_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

/// A named, ordered list of menu items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub items: Vec<MenuItem>,
}

impl Category {
    /// Whether an item with this display name is already listed.
    pub fn contains_name(&self, name: &str) -> bool {
        self.items.iter().any(|existing| existing.name == name)
    }
}

/// Mapping from category name to its ordered items.
///
/// Categories keep the order in which they were first seen on the page. The
/// catalog serializes as a JSON object whose keys follow that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuCatalog {
    categories: Vec<Category>,
}

impl MenuCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the category with this name, creating it (empty, at the end) if
    /// it does not exist yet.
    pub fn ensure_category(&mut self, name: &str) -> &mut Category {
        let idx = match self.categories.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.categories.push(Category {
                    name: name.to_string(),
                    items: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx]
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    #[cfg(test)]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    /// True when at least one category holds at least one item.
    pub fn has_items(&self) -> bool {
        self.categories.iter().any(|c| !c.items.is_empty())
    }

    /// Drop every category that ended up without items.
    pub fn prune_empty(&mut self) {
        self.categories.retain(|c| !c.items.is_empty());
    }

    /// `(category, item count)` pairs in catalog order.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.categories
            .iter()
            .map(|c| (c.name.as_str(), c.items.len()))
            .collect()
    }
}

impl Serialize for MenuCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &category.items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MenuCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = MenuCatalog;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category name to a list of menu items")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<MenuCatalog, A::Error> {
                let mut catalog = MenuCatalog::new();
                while let Some((name, items)) = access.next_entry::<String, Vec<MenuItem>>()? {
                    catalog.ensure_category(&name).items.extend(items);
                }
                Ok(catalog)
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

/// Postal address split into its parts, as published in structured metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StructuredAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

impl StructuredAddress {
    pub fn is_empty(&self) -> bool {
        self.street.is_none() && self.city.is_none() && self.state.is_none() && self.zip.is_none()
    }
}

/// Opening hours, with field labels such as `Pickup:` already stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Hours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeliveryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
}

/// A customer review shown on the restaurant page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Review {
    pub reviewer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub review_text: String,
}

/// Restaurant-level attributes.
///
/// Every attribute is optional: values come from direct page markers first,
/// then from structured metadata for whatever is still missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BusinessInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_address: Option<StructuredAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Hours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cuisines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_info: Option<DeliveryInfo>,
    /// At most ten reviews, in page order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<Review>,
}

/// The record written for one restaurant page.
///
/// This is the only artifact downstream consumers depend on.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RestaurantRecord {
    pub restaurant_info: BusinessInfo,
    pub menu: MenuCatalog,
    pub url: String,
    /// Local time of the scrape, `YYYY-MM-DD HH:MM:SS`.
    pub scraped_at: String,
}
