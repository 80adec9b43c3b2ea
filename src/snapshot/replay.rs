//! Scripted snapshot provider for tests.
//!
//! Serves one canned markup frame per `step` pixels of scroll offset, the way
//! a virtualized list swaps its rendered window as the viewport moves.

use super::SnapshotProvider;
use crate::error::ScrapeError;
use serde_json::Value;

pub struct ReplayPage {
    frames: Vec<String>,
    step: u64,
    /// Document height after 0, 1, 2... scrolls to the bottom; the last repeats.
    heights: Vec<u64>,
    pub bottom_scrolls: usize,
    position: u64,
    at_bottom: bool,
    scripts: Vec<(String, Value)>,
    /// Every call after `navigate` fails with this error.
    failure: Option<fn(String) -> ScrapeError>,
    pub navigated: Option<String>,
    pub snapshots_taken: usize,
    pub scroll_log: Vec<u64>,
}

impl ReplayPage {
    pub fn new(frames: Vec<String>, step: u64) -> Self {
        let height = step * frames.len() as u64;
        Self {
            frames,
            step,
            heights: vec![height],
            bottom_scrolls: 0,
            position: 0,
            at_bottom: false,
            scripts: Vec::new(),
            failure: None,
            navigated: None,
            snapshots_taken: 0,
            scroll_log: Vec::new(),
        }
    }

    /// A page that never changes, whatever the scroll position.
    pub fn single(markup: &str) -> Self {
        Self::new(vec![markup.to_string()], 300)
    }

    pub fn with_heights(mut self, heights: Vec<u64>) -> Self {
        self.heights = heights;
        self
    }

    /// Answer any script containing `needle` with `value`.
    pub fn answer(mut self, needle: &str, value: Value) -> Self {
        self.scripts.push((needle.to_string(), value));
        self
    }

    /// Make every page call fail, e.g. `failing_with(ScrapeError::Session)`.
    pub fn failing_with(mut self, failure: fn(String) -> ScrapeError) -> Self {
        self.failure = Some(failure);
        self
    }

    fn check(&self) -> Result<(), ScrapeError> {
        match self.failure {
            Some(failure) => Err(failure("connection closed".to_string())),
            None => Ok(()),
        }
    }

    fn frame(&self) -> &str {
        let last = self.frames.len().saturating_sub(1);
        let idx = if self.at_bottom {
            last
        } else {
            ((self.position / self.step.max(1)) as usize).min(last)
        };
        self.frames.get(idx).map(String::as_str).unwrap_or("")
    }
}

impl SnapshotProvider for ReplayPage {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        self.navigated = Some(url.to_string());
        Ok(())
    }

    async fn current_markup(&mut self) -> Result<String, ScrapeError> {
        self.check()?;
        self.snapshots_taken += 1;
        Ok(self.frame().to_string())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, ScrapeError> {
        self.check()?;
        Ok(self
            .scripts
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null))
    }

    async fn scroll_to(&mut self, position: u64) -> Result<(), ScrapeError> {
        self.check()?;
        self.position = position;
        self.at_bottom = false;
        self.scroll_log.push(position);
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ScrapeError> {
        self.check()?;
        self.at_bottom = true;
        self.bottom_scrolls += 1;
        Ok(())
    }

    async fn document_height(&mut self) -> Result<u64, ScrapeError> {
        self.check()?;
        let idx = self.bottom_scrolls.min(self.heights.len().saturating_sub(1));
        Ok(self.heights.get(idx).copied().unwrap_or(0))
    }
}
