//! Scroll-driven acquisition.
//!
//! The page only keeps a window of menu rows in the document tree, so the
//! controller walks the viewport down in small steps and merges a snapshot
//! after every step. Jumping straight to the bottom would skip the header
//! transitions in between and lose their categories for good.
//!
//! ```text
//! START ──> SCROLLING ──(position >= height)──> STABLE ──(height unchanged)──> DONE
//!               ^                                  │
//!               └────────────(height grew)─────────┘
//! ```
//!
//! SCROLLING also ends in DONE once `max_scrolls` steps have run.

use super::associate::Association;
use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::models::MenuCatalog;
use crate::snapshot::SnapshotProvider;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Counts rendered item fragments; used to detect when lazy loading settles.
pub const ITEM_COUNT_SCRIPT: &str =
    "document.querySelectorAll(\"[data-testid='restaurant-menu-item']\").length";
const NUDGE_UP_SCRIPT: &str = "window.scrollBy(0, -300)";
const NUDGE_DOWN_SCRIPT: &str = "window.scrollBy(0, 600)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Scrolling,
    Stable { height: u64 },
    Done,
}

/// Walk the page top to bottom, merging a snapshot after every step.
///
/// # Arguments
///
/// * `page` - The live page to scroll
/// * `config` - Scroll increment, settle waits and the `max_scrolls` cap
///
/// # Returns
///
/// The merged catalog with empty categories pruned, or the first error the
/// page reported.
#[instrument(level = "info", skip_all)]
pub async fn collect_by_scrolling<P: SnapshotProvider>(
    page: &mut P,
    config: &ScrapeConfig,
) -> Result<MenuCatalog, ScrapeError> {
    let mut association = Association::new();
    let mut position = 0u64;
    let mut steps = 0usize;
    let mut phase = Phase::Start;

    while phase != Phase::Done {
        phase = match phase {
            Phase::Start => {
                page.scroll_to(0).await?;
                sleep(config.top_settle()).await;
                Phase::Scrolling
            }
            Phase::Scrolling if steps >= config.max_scrolls => {
                warn!(steps, "Scroll cap reached; stopping");
                Phase::Done
            }
            Phase::Scrolling => {
                steps += 1;
                page.scroll_to(position).await?;
                sleep(config.scroll_settle()).await;

                let markup = page.current_markup().await?;
                let observation = association.observe(&markup);
                debug!(
                    step = steps,
                    position,
                    window_found = observation.window_found,
                    rows = observation.indexed_children,
                    added = observation.items_added,
                    categories = association.catalog().len(),
                    items = association.catalog().total_items(),
                    "Scroll step merged"
                );

                position += config.scroll_increment;
                let height = page.document_height().await?;
                if position >= height {
                    Phase::Stable { height }
                } else {
                    Phase::Scrolling
                }
            }
            Phase::Stable { height } => {
                page.scroll_to_bottom().await?;
                sleep(config.bottom_settle()).await;
                let final_height = page.document_height().await?;
                if final_height > height {
                    debug!(height, final_height, "Page grew at the bottom; resuming");
                    Phase::Scrolling
                } else {
                    debug!(height, "Reached bottom of page");
                    Phase::Done
                }
            }
            Phase::Done => Phase::Done,
        };
    }

    let catalog = association.finish();
    info!(
        steps,
        categories = catalog.len(),
        items = catalog.total_items(),
        "Scroll-driven extraction finished"
    );
    debug!(counts = ?catalog.counts(), "Items per category");
    Ok(catalog)
}

/// Scroll to the bottom until the rendered item count stops changing.
///
/// This only coaxes the page into loading its data; nothing is extracted.
#[instrument(level = "info", skip_all)]
pub async fn warm_up<P: SnapshotProvider>(page: &mut P, config: &ScrapeConfig) -> Result<(), ScrapeError> {
    let mut last_count = None;
    let mut stable_rounds = 0usize;

    for attempt in 0..config.warmup_max_attempts {
        let count = page.evaluate(ITEM_COUNT_SCRIPT).await?.as_u64().unwrap_or(0);
        debug!(attempt = attempt + 1, count, "Warm-up round");

        if last_count == Some(count) {
            stable_rounds += 1;
            if stable_rounds >= config.warmup_stable_rounds {
                info!(count, "Item count stabilized");
                break;
            }
        } else {
            stable_rounds = 0;
        }
        last_count = Some(count);

        page.scroll_to_bottom().await?;
        sleep(config.warmup_settle()).await;

        if attempt % 2 == 0 {
            page.evaluate(NUDGE_UP_SCRIPT).await?;
            sleep(config.warmup_nudge()).await;
            page.evaluate(NUDGE_DOWN_SCRIPT).await?;
            sleep(config.warmup_nudge()).await;
        }
    }
    Ok(())
}
