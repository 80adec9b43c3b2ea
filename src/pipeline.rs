//! Per-URL scraping pipeline.
//!
//! ```text
//! navigate ─> wait for load ─> warm-up ─> static snapshot ─┬─> business info
//!                                                          └─> strategy chain ─> record
//! ```
//!
//! [`scrape_restaurant`] works against any [`SnapshotProvider`];
//! [`process_url`] owns a Chromium session for one URL, bounds the whole page
//! by `page_timeout`, and writes the resulting artifact.

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::extract::business::extract_business_info;
use crate::extract::scroll::warm_up;
use crate::extract::strategies::extract_menu;
use crate::models::{MenuCatalog, RestaurantRecord};
use crate::outputs::{debug::write_debug_page, json::write_restaurant};
use crate::snapshot::SnapshotProvider;
use crate::snapshot::chrome::{BrowserOptions, ChromeSession};
use chrono::Local;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

const BODY_READY_SCRIPT: &str = "document.body !== null";
const MENU_READY_SCRIPT: &str = "!!(document.querySelector(\"[data-testid='restaurant-menu-item']\") || document.querySelector(\"[data-testid='menuSection-title']\"))";

/// What one page yielded.
#[derive(Debug)]
pub enum PageOutcome {
    Menu(RestaurantRecord),
    /// Every strategy came back empty. `markup` is the page as last seen.
    NoMenu { record: RestaurantRecord, markup: String },
}

/// Final status of one URL in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlStatus {
    Saved {
        path: PathBuf,
        categories: usize,
        items: usize,
    },
    NoMenu {
        debug_path: PathBuf,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlReport {
    pub url: String,
    pub status: UrlStatus,
}

/// Drive one page through load, warm-up and extraction.
#[instrument(level = "info", skip_all, fields(url = %url))]
pub async fn scrape_restaurant<P: SnapshotProvider>(
    page: &mut P,
    url: &str,
    config: &ScrapeConfig,
) -> Result<PageOutcome, ScrapeError> {
    page.navigate(url).await?;
    wait_for_page_load(page, url, config).await?;

    if let Err(e) = warm_up(page, config).await {
        warn!(error = %e, "Warm-up pass failed; continuing");
    }
    sleep(config.final_render()).await;

    let static_markup = page.current_markup().await?;
    let restaurant_info = extract_business_info(&static_markup);
    let found = extract_menu(page, &static_markup, config).await?;

    let mut record = RestaurantRecord {
        restaurant_info,
        menu: MenuCatalog::new(),
        url: url.to_string(),
        scraped_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    match found {
        Some((strategy, menu)) => {
            info!(%strategy, categories = menu.len(), items = menu.total_items(), "Scraped menu");
            record.menu = menu;
            Ok(PageOutcome::Menu(record))
        }
        None => {
            warn!("No menu items found on page");
            let markup = page.current_markup().await?;
            Ok(PageOutcome::NoMenu { record, markup })
        }
    }
}

/// Wait for the document body, then for menu markers.
///
/// A missing body is fatal for the page; missing menu markers only cost an
/// extra wait, since later strategies do not need them.
async fn wait_for_page_load<P: SnapshotProvider>(
    page: &mut P,
    url: &str,
    config: &ScrapeConfig,
) -> Result<(), ScrapeError> {
    if !poll_until(page, BODY_READY_SCRIPT, config).await? {
        return Err(ScrapeError::AcquisitionTimeout {
            url: url.to_string(),
            seconds: config.load_timeout_secs,
        });
    }
    sleep(config.render_wait()).await;

    if poll_until(page, MENU_READY_SCRIPT, config).await? {
        debug!("Menu content detected");
    } else {
        warn!("Menu content not found with primary markers; waiting longer");
        sleep(config.missing_menu_wait()).await;
    }
    sleep(config.stabilize_wait()).await;
    Ok(())
}

/// Evaluate `script` until it returns `true` or `load_timeout` elapses.
async fn poll_until<P: SnapshotProvider>(
    page: &mut P,
    script: &str,
    config: &ScrapeConfig,
) -> Result<bool, ScrapeError> {
    let deadline = Instant::now() + config.load_timeout();
    loop {
        match page.evaluate(script).await {
            Ok(Value::Bool(true)) => return Ok(true),
            Ok(_) => {}
            Err(e) if e.is_recoverable() => debug!(error = %e, "Readiness probe failed"),
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(config.load_poll()).await;
    }
}

/// Scrape one URL in its own browser session and write its artifact.
///
/// # Arguments
///
/// * `url` - The restaurant page to scrape
/// * `config` - Wait and scroll tuning, including `page_timeout`
/// * `options` - How to launch the browser
/// * `output_dir` - Where the JSON record or debug page is written
///
/// # Returns
///
/// A [`UrlReport`]. Never fails: every error ends up in the report.
#[instrument(level = "info", skip_all, fields(url = %url))]
pub async fn process_url(
    url: String,
    config: &ScrapeConfig,
    options: &BrowserOptions,
    output_dir: &Path,
) -> UrlReport {
    let outcome = match ChromeSession::launch(options).await {
        Ok(mut session) => {
            let outcome = match timeout(config.page_timeout(), scrape_restaurant(&mut session, &url, config)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ScrapeError::AcquisitionTimeout {
                    url: url.clone(),
                    seconds: config.page_timeout_secs,
                }),
            };
            session.shutdown().await;
            outcome
        }
        Err(e) => Err(e),
    };
    report_outcome(url, outcome, output_dir).await
}

/// Write the artifact for `outcome` and summarize it.
async fn report_outcome(url: String, outcome: Result<PageOutcome, ScrapeError>, output_dir: &Path) -> UrlReport {
    let status = match outcome {
        Ok(PageOutcome::Menu(record)) => match write_restaurant(&record, output_dir).await {
            Ok(path) => UrlStatus::Saved {
                path,
                categories: record.menu.len(),
                items: record.menu.total_items(),
            },
            Err(e) => UrlStatus::Failed { message: e.to_string() },
        },
        Ok(PageOutcome::NoMenu { record, markup }) => {
            debug!(name = record.restaurant_info.name.as_deref().unwrap_or("-"), "Saving markup of page without menu");
            match write_debug_page(&url, &markup, output_dir).await {
                Ok(debug_path) => UrlStatus::NoMenu { debug_path },
                Err(e) => UrlStatus::Failed { message: e.to_string() },
            }
        }
        Err(e) => UrlStatus::Failed { message: e.to_string() },
    };
    if let UrlStatus::Failed { message } = &status {
        error!(%url, %message, "Failed to scrape URL");
    }
    UrlReport { url, status }
}
