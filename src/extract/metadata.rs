//! Embedded structured metadata (`application/ld+json`).
//!
//! Pages embed schema.org records describing the restaurant and, sometimes,
//! its whole menu. Blocks may hold a single object, an array of objects, or an
//! `@graph` container; all three are flattened into one list of records.
//! Blocks that fail to parse are skipped.

use super::selector;
use crate::models::{MenuCatalog, MenuItem};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, trace};

static LD_JSON: Lazy<Selector> = Lazy::new(|| selector("script[type='application/ld+json']"));

const DEFAULT_SECTION_NAME: &str = "Unknown Category";

/// Every structured record found in the document.
pub fn records(document: &Html) -> Vec<Value> {
    let mut records = Vec::new();
    for script in document.select(&LD_JSON) {
        let text = script.text().collect::<String>();
        if text.trim().is_empty() {
            continue;
        }
        let value = match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(e) => {
                trace!(error = %e, "Skipping unparsable ld+json block");
                continue;
            }
        };
        let top_level = match value {
            Value::Array(values) => values,
            other => vec![other],
        };
        for record in top_level {
            if let Some(graph) = record.get("@graph").and_then(Value::as_array) {
                records.extend(graph.iter().cloned());
            }
            records.push(record);
        }
    }
    debug!(count = records.len(), "Read structured metadata records");
    records
}

/// Whether a record's `@type` (string or list) names `wanted`.
pub fn has_type(record: &Value, wanted: &str) -> bool {
    match record.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

/// A string field, also accepting numbers (`"ratingValue": 4.5`).
pub fn text_field(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Build a catalog from the `hasMenu`/`menu` sections of any record.
pub fn menu_from_records(records: &[Value]) -> MenuCatalog {
    let mut catalog = MenuCatalog::new();
    for record in records {
        let Some(menu) = record.get("hasMenu").or_else(|| record.get("menu")) else {
            continue;
        };
        for menu in as_objects(menu) {
            let Some(sections) = menu.get("hasMenuSection") else {
                continue;
            };
            for section in as_objects(sections) {
                let items: Vec<MenuItem> = section
                    .get("hasMenuItem")
                    .map(as_objects)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(menu_item)
                    .collect();
                if items.is_empty() {
                    continue;
                }
                let name = text_field(section, "name").unwrap_or_else(|| DEFAULT_SECTION_NAME.to_string());
                let category = catalog.ensure_category(&name);
                for item in items {
                    if !category.contains_name(&item.name) {
                        category.items.push(item);
                    }
                }
            }
        }
    }
    catalog
}

fn menu_item(item: &Value) -> Option<MenuItem> {
    let name = text_field(item, "name")?;
    let price = item
        .get("offers")
        .and_then(|offers| as_objects(offers).into_iter().next())
        .and_then(|offer| text_field(offer, "price"))
        .map(|price| format!("${price}"));
    Some(MenuItem {
        price,
        description: text_field(item, "description"),
        ..MenuItem::named(name)
    })
}

/// A value that may be one object or a list of them.
fn as_objects(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(values) => values.iter().filter(|v| v.is_object()).collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(blocks: &[&str]) -> Html {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{b}</script>"#))
            .collect();
        Html::parse_document(&format!("<html><head>{scripts}</head><body></body></html>"))
    }

    #[test]
    fn test_records_flatten_arrays_and_graphs() {
        let doc = page(&[
            r#"{"@type":"Organization","name":"Parent"}"#,
            r#"[{"@type":"WebSite"},{"@type":"Restaurant","name":"Noodle Bar"}]"#,
            r#"{"@graph":[{"@type":"BreadcrumbList"}]}"#,
            "{ not json",
        ]);
        let records = records(&doc);
        assert_eq!(records.len(), 5);
        assert!(records.iter().any(|r| has_type(r, "Restaurant")));
        assert!(records.iter().any(|r| has_type(r, "BreadcrumbList")));
    }

    #[test]
    fn test_has_type_accepts_lists() {
        let record: Value = serde_json::from_str(r#"{"@type":["LocalBusiness","Restaurant"]}"#).unwrap();
        assert!(has_type(&record, "Restaurant"));
        assert!(!has_type(&record, "Store"));
    }

    #[test]
    fn test_menu_sections_map_to_categories() {
        let doc = page(&[r#"{
            "@type": "Restaurant",
            "hasMenu": {
                "@type": "Menu",
                "hasMenuSection": [
                    {"name": "Starters", "hasMenuItem": [
                        {"name": "Edamame", "description": "Sea salt", "offers": {"price": "4.50"}},
                        {"description": "nameless"}
                    ]},
                    {"name": "Empty", "hasMenuItem": []},
                    {"hasMenuItem": {"name": "Mystery", "offers": [{"price": 7}]}}
                ]
            }
        }"#]);
        let catalog = menu_from_records(&records(&doc));

        assert_eq!(catalog.category_names(), vec!["Starters", "Unknown Category"]);
        let edamame = &catalog.get("Starters").unwrap().items[0];
        assert_eq!(edamame.price.as_deref(), Some("$4.50"));
        assert_eq!(edamame.description.as_deref(), Some("Sea salt"));
        assert_eq!(catalog.get("Starters").unwrap().items.len(), 1);
        assert_eq!(
            catalog.get("Unknown Category").unwrap().items[0].price.as_deref(),
            Some("$7")
        );
    }

    #[test]
    fn test_no_menu_records() {
        let doc = page(&[r#"{"@type":"Restaurant","name":"Noodle Bar"}"#]);
        assert!(menu_from_records(&records(&doc)).is_empty());
    }
}
