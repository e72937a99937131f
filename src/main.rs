//! # News Load More
//!
//! Scrapes a news listing that reveals its posts through a "load more"
//! button. A headless Chrome instance opens the listing, clicks the button
//! until enough posts are visible, and the rendered posts are saved as
//! title/description pairs in a JSON file.
//!
//! ## Usage
//!
//! ```sh
//! news_load_more -t 50 -o results.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Session**: Launch Chrome and open the listing (fatal on failure)
//! 2. **Loading**: Click "load more" until the post count exceeds the target
//! 3. **Extraction**: Parse titles and excerpts out of the posts container
//! 4. **Output**: Write the posts to JSON
//!
//! Loading, extraction and output failures are logged and the run carries
//! on with whatever it has; `--strict` turns them into a non-zero exit code.

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod browser;
mod cli;
mod config;
mod models;
mod outputs;
mod page;
mod retry;
mod scrapers;
mod utils;

use cli::Cli;
use config::ScrapeConfig;

#[tokio::main]
#[instrument]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
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
    info!("news_load_more starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Resolve configuration ----
    let mut config = match &args.config {
        Some(path) => ScrapeConfig::load(path).await?,
        None => ScrapeConfig::default(),
    };
    args.apply_to(&mut config);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    info!(
        url = %config.url,
        target = config.target_count,
        output = %config.output.display(),
        headless = config.browser.headless,
        "Resolved configuration"
    );

    // ---- Browser stages (blocking) ----
    let scrape_config = config.clone();
    let report = match tokio::task::spawn_blocking(move || scrapers::run(&scrape_config)).await? {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Browser session failed");
            return Err(e.into());
        }
    };

    // ---- Output ----
    let failures = scrapers::finish(report, &config.output).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        failures,
        "Execution complete"
    );

    if args.strict && failures > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
