//! Chromium-backed snapshot provider.
//!
//! Launches one Chromium process per session via `chromiumoxide` and exposes
//! its single page as a [`SnapshotProvider`]. The CDP event handler runs on a
//! tracked task that is aborted when the session shuts down or is dropped.

use super::SnapshotProvider;
use crate::error::ScrapeError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// How to start the browser for a session.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Explicit browser binary; `None` lets chromiumoxide locate one.
    pub chrome_path: Option<PathBuf>,
    /// CDP request timeout.
    pub request_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A live browser with one page, owned by a single extraction session.
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl ChromeSession {
    /// Start a browser and open a blank page.
    #[instrument(level = "info", skip_all, fields(headless = options.headless))]
    pub async fn launch(options: &BrowserOptions) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.request_timeout)
            .window_size(1920, 1080)
            .no_sandbox()
            .arg(format!("--user-agent={USER_AGENT}"))
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-background-timer-throttling")
            .arg("--disable-renderer-backgrounding")
            .arg("--disable-backgrounding-occluded-windows")
            .arg("--disable-background-networking")
            .arg("--disable-default-apps")
            .arg("--disable-sync")
            .arg("--no-first-run")
            .arg("--disable-blink-features=AutomationControlled");
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| ScrapeError::Session(format!("invalid browser config: {e}")))?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Session(format!("failed to launch browser: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(ScrapeError::Session(format!("failed to open page: {e}")));
            }
        };
        let hide_webdriver = AddScriptToEvaluateOnNewDocumentParams {
            source: HIDE_WEBDRIVER_SCRIPT.to_string(),
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        };
        if let Err(e) = page.execute(hide_webdriver).await {
            debug!(error = %e, "Could not mask navigator.webdriver");
        }

        info!("Browser session started");
        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    /// Close the browser and stop the handler task.
    ///
    /// Errors are logged, not returned: teardown must not mask the outcome of
    /// the extraction that preceded it.
    #[instrument(level = "info", skip_all)]
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser close failed");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Waiting for browser exit failed");
        }
        self.handler.abort();
        info!("Browser session closed");
    }

    async fn run(&self, script: &str) -> Result<Value, ScrapeError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(classify_cdp_error)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}

/// Split CDP failures into script-level problems and a broken session.
///
/// # Arguments
///
/// * `error` - The error returned by a CDP call
///
/// # Returns
///
/// [`ScrapeError::Script`] when the page answered but the script threw or its
/// result was unusable, [`ScrapeError::Session`] when the browser connection
/// itself failed (transport, channel, timeout, process).
fn classify_cdp_error(error: CdpError) -> ScrapeError {
    match error {
        CdpError::JavascriptException(_)
        | CdpError::Serde(_)
        | CdpError::InvalidMessage(..)
        | CdpError::Chrome(_)
        | CdpError::ChromeMessage(_)
        | CdpError::NotFound => ScrapeError::Script(error.to_string()),
        other => ScrapeError::Session(other.to_string()),
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

impl SnapshotProvider for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Session(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    async fn current_markup(&mut self) -> Result<String, ScrapeError> {
        self.page
            .content()
            .await
            .map_err(|e| ScrapeError::Session(format!("could not read page content: {e}")))
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, ScrapeError> {
        self.run(script).await
    }

    async fn scroll_to(&mut self, position: u64) -> Result<(), ScrapeError> {
        self.run(&format!("window.scrollTo(0, {position})")).await?;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ScrapeError> {
        self.run("window.scrollTo(0, document.body.scrollHeight)").await?;
        Ok(())
    }

    async fn document_height(&mut self) -> Result<u64, ScrapeError> {
        let value = self.run("document.body.scrollHeight").await?;
        value
            .as_f64()
            .map(|h| h.max(0.0) as u64)
            .ok_or_else(|| ScrapeError::Script(format!("document height was not a number: {value}")))
    }
}
