//! Command-line interface definitions.
//!
//! Every option is optional: without flags the scraper runs against the
//! built-in defaults (or the `--config` file), and each flag that is given
//! overrides the corresponding configuration value.

use crate::config::ScrapeConfig;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Defaults: UECE news listing, 50 posts, ./results.json
/// news_load_more
///
/// # Custom target and output, browser window visible
/// news_load_more -t 120 -o out/news.json --headed
///
/// # Everything from a file, failing the process on partial results
/// news_load_more -c scrape.yaml --strict
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// News listing URL
    #[arg(short, long, env = "NEWS_URL")]
    pub url: Option<String>,

    /// Output JSON file
    #[arg(short, long, env = "NEWS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Keep clicking "load more" until more than this many posts are visible
    #[arg(short, long)]
    pub target: Option<usize>,

    /// Maximum number of "load more" clicks
    #[arg(long)]
    pub max_clicks: Option<usize>,

    /// Seconds to pause after scrolling the button into view
    #[arg(long)]
    pub poll_interval: Option<f64>,

    /// Seconds to pause after each click
    #[arg(long)]
    pub click_settle: Option<f64>,

    /// Seconds to wait for the button to appear or become clickable
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Chrome/Chromium binary to launch
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Keep a single entry per title
    #[arg(long)]
    pub dedupe_titles: bool,

    /// Exit with a non-zero status when loading, extraction or writing fails
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    /// Override `config` with every option given on the command line.
    pub fn apply_to(&self, config: &mut ScrapeConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(target) = self.target {
            config.target_count = target;
        }
        if let Some(max_clicks) = self.max_clicks {
            config.max_clicks = max_clicks;
        }
        if let Some(secs) = self.poll_interval {
            config.poll_interval_secs = secs;
        }
        if let Some(secs) = self.click_settle {
            config.click_settle_secs = secs;
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(path) = &self.chrome_path {
            config.browser.chrome_path = Some(path.clone());
        }
        if self.dedupe_titles {
            config.dedupe_titles = true;
        }
    }
}
