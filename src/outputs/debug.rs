//! Diagnostic page dumps.

use crate::error::ScrapeError;
use crate::utils::trailing_segment;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const DEFAULT_SEGMENT: &str = "page";

/// Save `markup` as `{output_dir}/debug_{segment}.html`, where `segment` is
/// the last path segment of `url`.
#[instrument(level = "info", skip_all, fields(url = %url))]
pub async fn write_debug_page(url: &str, markup: &str, output_dir: &Path) -> Result<PathBuf, ScrapeError> {
    fs::create_dir_all(output_dir).await?;
    let segment = trailing_segment(url).unwrap_or_else(|| DEFAULT_SEGMENT.to_string());
    let path = output_dir.join(format!("debug_{segment}.html"));
    fs::write(&path, markup).await?;
    info!(path = %path.display(), "Saved page markup for debugging");
    Ok(path)
}
