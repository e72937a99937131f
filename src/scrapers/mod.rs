//! The scrape pipeline: open the browser, load posts, extract them.
//!
//! # Stages
//!
//! | Stage | Module | Failure handling |
//! |-------|--------|------------------|
//! | Session | [`crate::browser`] | Fatal: launch and navigation errors propagate |
//! | Loading | [`loader`] | Never fatal: reported as a [`LoadOutcome`] |
//! | Extraction | [`extractor`] | Reported as an [`ExtractError`]; an empty result is written |
//! | Output | [`crate::outputs::json`] | Logged; counted as a failure |
//!
//! The browser stages are blocking; [`run`] is meant to be called from
//! `tokio::task::spawn_blocking`. [`finish`] then writes whatever the run
//! produced.

pub mod extractor;
pub mod loader;

use crate::browser::BrowserSession;
use crate::config::ScrapeConfig;
use crate::models::{LoadOutcome, Post};
use crate::outputs::json;
use crate::page::PageError;
use extractor::ExtractError;
use std::path::Path;
use tracing::{error, info, instrument, warn};

/// What a scrape produced before anything is written.
#[derive(Debug)]
pub struct ScrapeReport {
    pub load: LoadOutcome,
    pub posts: Result<Vec<Post>, ExtractError>,
}

/// Run the browser stages against `config.url`.
///
/// The browser is closed before returning, whatever the loader and
/// extractor report.
#[instrument(level = "info", skip_all, fields(url = %config.url))]
pub fn run(config: &ScrapeConfig) -> Result<ScrapeReport, PageError> {
    let session = BrowserSession::open(&config.browser)?;
    session.navigate(&config.url)?;

    let load = loader::load_until(&session, &config.loader_settings());
    let posts = extractor::extract(&session, &config.extractor_settings());
    session.close();

    Ok(ScrapeReport { load, posts })
}

/// Log the report, write the posts to `output` and return the number of
/// stages that failed.
///
/// An extraction error is written as an empty list, so the output file
/// always reflects the latest run.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub async fn finish(report: ScrapeReport, output: &Path) -> usize {
    let ScrapeReport { load, posts } = report;
    let mut failures = 0usize;

    if load.is_complete() {
        info!(count = load.count(), clicks = load.clicks(), "Finished loading posts");
    } else {
        failures += 1;
        warn!(
            count = load.count(),
            clicks = load.clicks(),
            outcome = %load,
            "Loading stopped before the post target; extracting what is loaded"
        );
    }

    let posts = match posts {
        Ok(posts) => posts,
        Err(e) => {
            failures += 1;
            error!(error = %e, "Failed to extract posts; writing an empty result");
            Vec::new()
        }
    };

    match json::write_posts(&posts, output).await {
        Ok(()) => info!(count = posts.len(), "Web scraping finished successfully"),
        Err(e) => {
            failures += 1;
            error!(error = %e, "Failed to save posts");
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_posts(path: &Path) -> Vec<Post> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_finish_complete_run_has_no_failures() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let report = ScrapeReport {
            load: LoadOutcome::TargetReached { count: 55, clicks: 3 },
            posts: Ok(vec![Post::new("A", "a")]),
        };

        assert_eq!(finish(report, &path).await, 0);
        assert_eq!(read_posts(&path), vec![Post::new("A", "a")]);
    }

    #[tokio::test]
    async fn test_finish_writes_empty_list_on_extraction_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "stale").unwrap();
        let report = ScrapeReport {
            load: LoadOutcome::TargetReached { count: 55, clicks: 3 },
            posts: Err(ExtractError::CountMismatch {
                titles: 3,
                descriptions: 2,
            }),
        };

        assert_eq!(finish(report, &path).await, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
    }

    #[tokio::test]
    async fn test_finish_incomplete_load_still_writes_posts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let posts = vec![Post::new("A", "a"), Post::new("B", "b")];
        let report = ScrapeReport {
            load: LoadOutcome::NotClickable { count: 20, clicks: 1 },
            posts: Ok(posts.clone()),
        };

        assert_eq!(finish(report, &path).await, 1);
        assert_eq!(read_posts(&path), posts);
    }

    #[tokio::test]
    async fn test_finish_counts_every_failed_stage() {
        let dir = TempDir::new().unwrap();
        let report = ScrapeReport {
            load: LoadOutcome::ButtonMissing { count: 10 },
            posts: Err(ExtractError::ContainerMissing(".cc-posts".to_string())),
        };

        // The output path is a directory, so the write fails as well.
        assert_eq!(finish(report, dir.path()).await, 3);
    }
}
