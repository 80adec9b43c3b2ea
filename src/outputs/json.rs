//! JSON output of restaurant records.
//!
//! One file per restaurant, named after the restaurant slug in its URL:
//! `{output_dir}/{slug}_data.json`. Keys keep the record's field order and
//! menu categories keep their first-seen order.

use crate::error::ScrapeError;
use crate::models::RestaurantRecord;
use crate::utils::restaurant_slug;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`RestaurantRecord`] as pretty-printed JSON.
///
/// Creates `output_dir` if needed and returns the path written.
#[instrument(level = "info", skip_all, fields(url = %record.url))]
pub async fn write_restaurant(record: &RestaurantRecord, output_dir: &Path) -> Result<PathBuf, ScrapeError> {
    let json = serde_json::to_string_pretty(record)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(dir = %output_dir.display(), error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = output_dir.join(format!("{}_data.json", restaurant_slug(&record.url)));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote restaurant JSON");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusinessInfo, MenuCatalog, MenuItem};
    use serde_json::Value;

    fn record() -> RestaurantRecord {
        let mut menu = MenuCatalog::new();
        menu.ensure_category("Pizza").items.push(MenuItem {
            price: Some("$14.00".into()),
            ..MenuItem::named("Margherita")
        });
        menu.ensure_category("Drinks").items.push(MenuItem::named("Soda"));
        RestaurantRecord {
            restaurant_info: BusinessInfo {
                name: Some("Joe's Pizza".into()),
                ..BusinessInfo::default()
            },
            menu,
            url: "https://www.grubhub.com/restaurant/joes-pizza-12-main-st/2345678".into(),
            scraped_at: "2024-05-01 12:00:00".into(),
        }
    }

    #[tokio::test]
    async fn test_writes_slug_named_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_restaurant(&record(), dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("joes-pizza-12-main-st_data.json"));

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(text.contains("\n  \"restaurant_info\""));
        let positions: Vec<usize> = ["restaurant_info", "menu", "url", "scraped_at"]
            .iter()
            .map(|k| text.find(&format!("\"{k}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.find("\"Pizza\"").unwrap() < text.find("\"Drinks\"").unwrap());

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["menu"]["Pizza"][0]["price"], "$14.00");
        assert!(value["menu"]["Drinks"][0].get("price").is_none());
        assert!(value["restaurant_info"].get("phone").is_none());
    }
}
