//! Command-line interface definitions for Menu Harvest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! URLs come either from a list file or a single `--url`; every tuning knob
//! not exposed here lives in the optional YAML config file.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Command-line arguments for the Menu Harvest application.
///
/// # Examples
///
/// ```sh
/// # One restaurant
/// menu_harvest -u https://www.grubhub.com/restaurant/joes-pizza/2345678
///
/// # A list of URLs, four browsers at a time
/// menu_harvest urls.txt -o ./menus --workers 4
///
/// # Visible browser with a custom binary and tuning file
/// menu_harvest urls.txt --no-headless --chrome-path /usr/bin/chromium --config tuning.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "url"])))]
pub struct Cli {
    /// File with restaurant URLs, one per line (`#` starts a comment line)
    pub input: Option<PathBuf>,

    /// Scrape a single restaurant URL
    #[arg(short, long)]
    pub url: Option<String>,

    /// Output directory for JSON records and debug pages
    #[arg(short, long, default_value = "scraped_data")]
    pub output_dir: PathBuf,

    /// Show the browser window
    #[arg(long)]
    pub no_headless: bool,

    /// Number of pages scraped concurrently, one browser each
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Seconds to wait for page elements [default: 30, or the config file value]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds allowed for one whole page [default: 600, or the config file value]
    #[arg(long)]
    pub page_timeout: Option<u64>,

    /// Optional path to a YAML tuning file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Chrome/Chromium binary to launch
    #[arg(long, env = "CHROME_BINARY_PATH")]
    pub chrome_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "menu_harvest",
            "urls.txt",
            "--output-dir",
            "./menus",
            "--workers",
            "4",
            "--timeout",
            "45",
        ]);

        assert_eq!(cli.input, Some(PathBuf::from("urls.txt")));
        assert_eq!(cli.output_dir, PathBuf::from("./menus"));
        assert_eq!(cli.workers, 4);
        assert_eq!(cli.timeout, Some(45));
        assert!(cli.page_timeout.is_none());
        assert!(!cli.no_headless);
    }

    #[test]
    fn test_cli_short_flags_and_defaults() {
        let cli = Cli::parse_from(["menu_harvest", "-u", "https://example.com/restaurant/a/1"]);

        assert_eq!(cli.url.as_deref(), Some("https://example.com/restaurant/a/1"));
        assert!(cli.input.is_none());
        assert_eq!(cli.output_dir, PathBuf::from("scraped_data"));
        assert_eq!(cli.workers, 1);
    }

    #[test]
    fn test_cli_requires_a_source() {
        assert!(Cli::try_parse_from(["menu_harvest"]).is_err());
    }

    #[test]
    fn test_cli_rejects_zero_workers() {
        assert!(Cli::try_parse_from(["menu_harvest", "-u", "https://example.com", "--workers", "0"]).is_err());
    }
}
