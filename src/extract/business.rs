//! Restaurant-level attributes from a static snapshot.
//!
//! Direct page markers are read first. Embedded `Restaurant` metadata then
//! fills whatever is still missing, and contributes the fields the page only
//! publishes there (structured address, cuisines, price range). A field that
//! cannot be found is simply left out.

use super::{element_text, metadata, selector};
use crate::models::{BusinessInfo, DeliveryInfo, Hours, Review, StructuredAddress};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;
use tracing::{debug, instrument};

const MAX_REVIEWS: usize = 10;

static NAME_MARKED: Lazy<Selector> = Lazy::new(|| selector("h1[data-testid='restaurant-name']"));
static NAME_ANY: Lazy<Selector> = Lazy::new(|| selector("h1"));
static ADDRESS_MARKED: Lazy<Selector> = Lazy::new(|| selector("[data-testid='restaurant-address']"));
static SPAN: Lazy<Selector> = Lazy::new(|| selector("span"));
static PHONE_BUTTON: Lazy<Selector> =
    Lazy::new(|| selector("button[data-testid='restaurant-phone-button']"));
static PHONE_LINK: Lazy<Selector> = Lazy::new(|| selector("a[href*='tel:']"));
static WITH_TESTID: Lazy<Selector> = Lazy::new(|| selector("[data-testid]"));
static RATING: Lazy<Selector> =
    Lazy::new(|| selector("[data-testid*='rating'], [data-testid*='star']"));
static REVIEW_ITEM: Lazy<Selector> =
    Lazy::new(|| selector("[data-testid='restaurant-review-item']"));
static REVIEWER: Lazy<Selector> = Lazy::new(|| selector("[data-testid='review-reviewer-name']"));
static REVIEW_CONTENT: Lazy<Selector> = Lazy::new(|| selector("[data-testid='review-content']"));
static CLASSED_SPAN: Lazy<Selector> = Lazy::new(|| selector("span[class]"));

static PICKUP_HOURS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"pickupHours\d+").unwrap());
static DELIVERY_HOURS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"deliveryHours\d+").unwrap());
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.?\d*").unwrap());
static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static REVIEW_COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\s+review").unwrap());
static DELIVERY_FEE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\$[\d.]+\s+delivery\s+fee").unwrap());
static DOLLAR_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[\d.]+").unwrap());
static DELIVERY_TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\d+[-–]\d+\s+min").unwrap());
static REVIEW_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(ago|Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec|\d{1,2},?\s*\d{4})")
        .unwrap()
});
static HOURS_IN_REVIEW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Pickup:|Delivery:|\d{1,2}:\d{2}\s*(am|pm)").unwrap());

/// Extract everything known about the restaurant from `markup`.
#[instrument(level = "info", skip_all)]
pub fn extract_business_info(markup: &str) -> BusinessInfo {
    let document = Html::parse_document(markup);
    let texts = visible_text_nodes(&document);

    let mut info = BusinessInfo {
        name: first_text(&document, &[&*NAME_MARKED, &*NAME_ANY]),
        address: document
            .select(&ADDRESS_MARKED)
            .find_map(element_text)
            .or_else(|| {
                document
                    .select(&SPAN)
                    .filter_map(element_text)
                    .find(|text| text.starts_with('•'))
            }),
        phone: first_text(&document, &[&*PHONE_BUTTON, &*PHONE_LINK]),
        hours: find_hours(&document),
        rating: document
            .select(&RATING)
            .next()
            .and_then(element_text)
            .and_then(|text| DECIMAL_RE.find(&text).map(|m| m.as_str().to_string())),
        review_count: texts
            .iter()
            .find(|text| REVIEW_COUNT_RE.is_match(text))
            .and_then(|text| INTEGER_RE.find(text).map(|m| m.as_str().to_string())),
        delivery_info: find_delivery_info(&texts),
        reviews: find_reviews(&document),
        ..BusinessInfo::default()
    };

    for record in metadata::records(&document)
        .iter()
        .filter(|record| metadata::has_type(record, "Restaurant"))
    {
        overlay_restaurant_record(&mut info, record);
    }

    debug!(
        name = info.name.as_deref().unwrap_or("-"),
        reviews = info.reviews.len(),
        cuisines = info.cuisines.len(),
        "Business info extracted"
    );
    info
}

fn first_text(document: &Html, selectors: &[&Selector]) -> Option<String> {
    selectors
        .iter()
        .find_map(|sel| document.select(sel).find_map(element_text))
}

/// Text nodes outside `script` and `style`, whitespace-normalized, non-empty.
fn visible_text_nodes(document: &Html) -> Vec<String> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element())
                .is_some_and(|el| matches!(el.name(), "script" | "style"));
            if hidden {
                return None;
            }
            let text = crate::utils::normalize_text(text);
            (!text.is_empty()).then_some(text)
        })
        .collect()
}

fn find_hours(document: &Html) -> Option<Hours> {
    let mut pickup = Vec::new();
    let mut delivery = Vec::new();
    for element in document.select(&WITH_TESTID) {
        let Some(testid) = element.value().attr("data-testid") else {
            continue;
        };
        let (target, label) = if PICKUP_HOURS_RE.is_match(testid) {
            (&mut pickup, "Pickup:")
        } else if DELIVERY_HOURS_RE.is_match(testid) {
            (&mut delivery, "Delivery:")
        } else {
            continue;
        };
        if let Some(text) = element_text(element) {
            let text = text.strip_prefix(label).map(str::trim).unwrap_or(text.as_str());
            if !text.is_empty() {
                target.push(text.to_string());
            }
        }
    }

    let join = |parts: Vec<String>| (!parts.is_empty()).then(|| parts.join(" "));
    let hours = Hours {
        pickup: join(pickup),
        delivery: join(delivery),
    };
    (hours.pickup.is_some() || hours.delivery.is_some()).then_some(hours)
}

fn find_delivery_info(texts: &[String]) -> Option<DeliveryInfo> {
    let delivery_fee = texts
        .iter()
        .find(|text| DELIVERY_FEE_RE.is_match(text))
        .and_then(|text| DOLLAR_AMOUNT_RE.find(text).map(|m| m.as_str().to_string()));
    let delivery_time = texts
        .iter()
        .find_map(|text| DELIVERY_TIME_RE.find(text).map(|m| m.as_str().to_string()));

    (delivery_fee.is_some() || delivery_time.is_some()).then_some(DeliveryInfo {
        delivery_fee,
        delivery_time,
    })
}

fn find_reviews(document: &Html) -> Vec<Review> {
    document
        .select(&REVIEW_ITEM)
        .filter_map(parse_review)
        .take(MAX_REVIEWS)
        .collect()
}

fn parse_review(container: ElementRef<'_>) -> Option<Review> {
    let reviewer_name = container.select(&REVIEWER).find_map(element_text)?;
    let review_text = container
        .select(&REVIEW_CONTENT)
        .find_map(element_text)
        .filter(|text| !HOURS_IN_REVIEW_RE.is_match(text))?;
    let date = container
        .select(&CLASSED_SPAN)
        .filter_map(element_text)
        .find(|text| REVIEW_DATE_RE.is_match(text));
    Some(Review {
        reviewer_name,
        date,
        review_text,
    })
}

/// Fill gaps in `info` from one `Restaurant` record.
fn overlay_restaurant_record(info: &mut BusinessInfo, record: &Value) {
    if info.structured_address.is_none() {
        if let Some(address) = record.get("address").filter(|a| a.is_object()) {
            let structured = StructuredAddress {
                street: metadata::text_field(address, "streetAddress"),
                city: metadata::text_field(address, "addressLocality"),
                state: metadata::text_field(address, "addressRegion"),
                zip: metadata::text_field(address, "postalCode"),
            };
            if !structured.is_empty() {
                info.structured_address = Some(structured);
            }
        }
    }

    if info.phone.is_none() {
        info.phone = metadata::text_field(record, "telephone");
    }

    let cuisines: Vec<String> = match record.get("servesCuisine") {
        Some(Value::String(one)) => vec![one.trim().to_string()],
        Some(Value::Array(many)) => many
            .iter()
            .filter_map(Value::as_str)
            .map(|c| c.trim().to_string())
            .collect(),
        _ => Vec::new(),
    };
    info.cuisines = std::mem::take(&mut info.cuisines)
        .into_iter()
        .chain(cuisines)
        .filter(|c| !c.is_empty())
        .unique()
        .collect();

    if info.price_range.is_none() {
        info.price_range = metadata::text_field(record, "priceRange");
    }

    if let Some(aggregate) = record.get("aggregateRating") {
        if info.rating.is_none() {
            info.rating = metadata::text_field(aggregate, "ratingValue");
        }
        if info.review_count.is_none() {
            info.review_count = metadata::text_field(aggregate, "reviewCount");
        }
    }
}
