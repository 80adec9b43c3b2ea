//! # Menu Harvest
//!
//! Extracts restaurant details and complete, categorized menus from restaurant
//! pages that render their menu as a virtualized, JavaScript-driven list.
//!
//! ## Features
//!
//! - Drives a headless Chromium session per URL and scrolls the page in small
//!   steps, merging every rendered window into one ordered menu
//! - Falls back to in-page state, embedded `ld+json` metadata, and a single
//!   static snapshot when scrolling finds nothing
//! - Collects name, address, phone, hours, rating, delivery details and
//!   recent reviews
//! - Writes one pretty JSON record per restaurant, or the raw page markup
//!   when no menu could be found
//!
//! ## Usage
//!
//! ```sh
//! menu_harvest urls.txt -o ./menus --workers 2
//! ```
//!
//! ## Architecture
//!
//! 1. **Input**: Read the URL list (or a single `--url`) and tuning config
//! 2. **Acquisition**: Load each page in its own browser, wait, warm up lazy loading
//! 3. **Extraction**: Business info from a static snapshot, menu via the strategy chain
//! 4. **Output**: `<slug>_data.json` or `debug_<segment>.html` per URL

use clap::Parser;
use futures::stream::{self, StreamExt};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extract;
mod models;
mod outputs;
mod pipeline;
mod snapshot;
mod utils;

use cli::Cli;
use config::ScrapeConfig;
use pipeline::{UrlReport, UrlStatus, process_url};
use snapshot::chrome::BrowserOptions;
use utils::{ensure_writable_dir, read_url_list};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("menu_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Config ----
    let mut config = match &args.config {
        Some(path) => ScrapeConfig::load(path).await.inspect_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load config");
        })?,
        None => ScrapeConfig::default(),
    };
    if let Some(secs) = args.timeout {
        config.load_timeout_secs = secs;
    }
    if let Some(secs) = args.page_timeout {
        config.page_timeout_secs = secs;
    }

    let options = BrowserOptions {
        headless: !args.no_headless,
        chrome_path: args.chrome_path.clone(),
        ..BrowserOptions::default()
    };

    // ---- URLs ----
    let urls = match (&args.url, &args.input) {
        (Some(url), _) => vec![url.clone()],
        (None, Some(path)) => read_url_list(path).await.inspect_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to read URL list");
        })?,
        (None, None) => Vec::new(),
    };
    if urls.is_empty() {
        error!("No URLs to scrape");
        return Err("no URLs to scrape".into());
    }

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // ---- Scrape, `workers` pages at a time ----
    let workers = usize::from(args.workers);
    let total = urls.len();
    info!(total, workers, headless = options.headless, "Starting scrape");

    let reports: Vec<UrlReport> = stream::iter(urls)
        .map(|url| process_url(url, &config, &options, &args.output_dir))
        .buffer_unordered(workers)
        .collect()
        .await;

    let mut saved = 0usize;
    let mut no_menu = 0usize;
    let mut failed = 0usize;
    for report in &reports {
        match &report.status {
            UrlStatus::Saved { path, categories, items } => {
                saved += 1;
                info!(url = %report.url, path = %path.display(), categories, items, "Saved");
            }
            UrlStatus::NoMenu { debug_path } => {
                no_menu += 1;
                warn!(url = %report.url, debug_path = %debug_path.display(), "No menu found");
            }
            UrlStatus::Failed { message } => {
                failed += 1;
                warn!(url = %report.url, %message, "Failed");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        total,
        saved,
        no_menu,
        failed,
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
