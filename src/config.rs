//! Tuning parameters for page acquisition.
//!
//! The wait durations and the scroll step were tuned by hand against live
//! pages, so they are configuration rather than constants. Defaults can be
//! overridden with a YAML file passed via `--config`; any key left out keeps
//! its default.
//!
//! ```yaml
//! scroll_increment: 400
//! scroll_settle_ms: 750
//! max_scrolls: 150
//! ```

use crate::error::ScrapeError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Timing and bounds for one page extraction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrapeConfig {
    /// Pixels to advance per scroll step.
    pub scroll_increment: u64,
    /// Hard cap on scroll steps per page.
    pub max_scrolls: usize,
    /// Wait after each scroll step before taking a snapshot.
    pub scroll_settle_ms: u64,
    /// Wait after returning to the top before scrolling starts.
    pub top_settle_ms: u64,
    /// Wait after the forced scroll to the bottom before re-measuring.
    pub bottom_settle_ms: u64,

    /// Upper bound for each readiness poll (body, then menu markers).
    pub load_timeout_secs: u64,
    /// Poll interval while waiting for readiness.
    pub load_poll_ms: u64,
    /// Wait for client-side rendering after the body appears.
    pub render_wait_ms: u64,
    /// Extra wait when no menu marker appeared in time.
    pub missing_menu_wait_ms: u64,
    /// Final wait before the warm-up pass.
    pub stabilize_wait_ms: u64,

    /// Warm-up rounds before extraction; zero disables warm-up.
    pub warmup_max_attempts: usize,
    /// Unchanged item counts needed to end warm-up early.
    pub warmup_stable_rounds: usize,
    pub warmup_settle_ms: u64,
    pub warmup_nudge_ms: u64,
    /// Wait after warm-up before the static snapshot.
    pub final_render_ms: u64,

    /// Bound on a whole page extraction, from navigation to packaged record.
    pub page_timeout_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            scroll_increment: 300,
            max_scrolls: 100,
            scroll_settle_ms: 500,
            top_settle_ms: 1000,
            bottom_settle_ms: 1000,
            load_timeout_secs: 30,
            load_poll_ms: 250,
            render_wait_ms: 3000,
            missing_menu_wait_ms: 5000,
            stabilize_wait_ms: 3000,
            warmup_max_attempts: 30,
            warmup_stable_rounds: 3,
            warmup_settle_ms: 2000,
            warmup_nudge_ms: 1000,
            final_render_ms: 2000,
            page_timeout_secs: 600,
        }
    }
}

impl ScrapeConfig {
    /// Parse a YAML tuning document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ScrapeError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML tuning file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ScrapeError> {
        let yaml = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&yaml)?;
        info!(?config, "Loaded scrape configuration");
        Ok(config)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn top_settle(&self) -> Duration {
        Duration::from_millis(self.top_settle_ms)
    }

    pub fn bottom_settle(&self) -> Duration {
        Duration::from_millis(self.bottom_settle_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn load_poll(&self) -> Duration {
        Duration::from_millis(self.load_poll_ms)
    }

    pub fn render_wait(&self) -> Duration {
        Duration::from_millis(self.render_wait_ms)
    }

    pub fn missing_menu_wait(&self) -> Duration {
        Duration::from_millis(self.missing_menu_wait_ms)
    }

    pub fn stabilize_wait(&self) -> Duration {
        Duration::from_millis(self.stabilize_wait_ms)
    }

    pub fn warmup_settle(&self) -> Duration {
        Duration::from_millis(self.warmup_settle_ms)
    }

    pub fn warmup_nudge(&self) -> Duration {
        Duration::from_millis(self.warmup_nudge_ms)
    }

    pub fn final_render(&self) -> Duration {
        Duration::from_millis(self.final_render_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// Same bounds, no waiting. Used to replay scripted pages.
    #[cfg(test)]
    pub fn without_waits() -> Self {
        Self {
            scroll_settle_ms: 0,
            top_settle_ms: 0,
            bottom_settle_ms: 0,
            load_timeout_secs: 1,
            load_poll_ms: 0,
            render_wait_ms: 0,
            missing_menu_wait_ms: 0,
            stabilize_wait_ms: 0,
            warmup_settle_ms: 0,
            warmup_nudge_ms: 0,
            final_render_ms: 0,
            ..Self::default()
        }
    }
}
