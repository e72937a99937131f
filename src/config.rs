//! Scrape configuration.
//!
//! All settings live in [`ScrapeConfig`] and are passed explicitly into each
//! stage. Values are resolved in three layers:
//!
//! 1. Built-in defaults (the UECE news listing)
//! 2. An optional YAML file (`--config`)
//! 3. Command-line flags, see [`crate::cli::Cli::apply_to`]
//!
//! # Example
//!
//! ```yaml
//! url: https://www.uece.br/uece/noticias/
//! output: out/results.json
//! target_count: 80
//! timeout_secs: 15
//! selectors:
//!   button: .cc-button
//! browser:
//!   headless: false
//! ```
//!
//! Durations are given in seconds and may be fractional.

use crate::scrapers::extractor::ExtractorSettings;
use crate::scrapers::loader::LoaderSettings;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid url `{url}`: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a scrape run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Listing page to open.
    pub url: String,
    /// Destination of the JSON output.
    pub output: PathBuf,
    /// Clicking stops once more than this many posts are visible.
    pub target_count: usize,
    /// Hard cap on load-more clicks.
    pub max_clicks: usize,
    /// Pause after scrolling the button into view.
    pub poll_interval_secs: f64,
    /// Pause after each click while new posts render.
    pub click_settle_secs: f64,
    /// How long to wait for the button to appear or become clickable.
    pub timeout_secs: f64,
    /// Interval between probes while waiting on the button.
    pub wait_poll_secs: f64,
    /// Random extra delay (upper bound) added to each probe interval.
    pub wait_jitter_secs: f64,
    /// Collapse posts sharing a title into one entry.
    pub dedupe_titles: bool,
    pub selectors: Selectors,
    pub browser: BrowserSettings,
}

/// CSS selectors describing the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Element holding the posts.
    pub container: String,
    /// Direct children of the container that count as posts.
    pub post: String,
    /// The load-more control.
    pub button: String,
    pub title: String,
    pub excerpt: String,
}

/// Browser launch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window; also disables GPU, sandbox and /dev/shm usage.
    pub headless: bool,
    pub window_size: (u32, u32),
    /// Chrome binary to launch instead of the auto-detected one.
    pub chrome_path: Option<PathBuf>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: "https://www.uece.br/uece/noticias/".to_string(),
            output: PathBuf::from("results.json"),
            target_count: 50,
            max_clicks: 100,
            poll_interval_secs: 1.0,
            click_settle_secs: 3.0,
            timeout_secs: 10.0,
            wait_poll_secs: 0.5,
            wait_jitter_secs: 0.0,
            dedupe_titles: false,
            selectors: Selectors::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            container: ".cc-posts".to_string(),
            post: ".cc-post".to_string(),
            button: ".cc-button".to_string(),
            title: "h3".to_string(),
            excerpt: ".cc-post-excerpt".to_string(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            chrome_path: None,
        }
    }
}

impl ScrapeConfig {
    /// Load a configuration from a YAML file. Missing keys keep their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration file");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// Check the values that would otherwise make a run meaningless or hang.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.url).map_err(|source| ConfigError::Url {
            url: self.url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https" | "file") {
            return Err(ConfigError::Invalid(format!(
                "unsupported url scheme `{}`",
                url.scheme()
            )));
        }

        for (name, secs) in [
            ("poll_interval_secs", self.poll_interval_secs),
            ("click_settle_secs", self.click_settle_secs),
            ("wait_jitter_secs", self.wait_jitter_secs),
        ] {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::Invalid(format!("{name} must be a non-negative number of seconds")));
            }
        }
        for (name, secs) in [
            ("timeout_secs", self.timeout_secs),
            ("wait_poll_secs", self.wait_poll_secs),
        ] {
            match Duration::try_from_secs_f64(secs) {
                Ok(d) if !d.is_zero() => {}
                _ => {
                    return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
                }
            }
        }

        let selectors = [
            ("selectors.container", &self.selectors.container),
            ("selectors.post", &self.selectors.post),
            ("selectors.button", &self.selectors.button),
            ("selectors.title", &self.selectors.title),
            ("selectors.excerpt", &self.selectors.excerpt),
        ];
        if let Some((name, _)) = selectors.iter().find(|(_, s)| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("{name} must not be empty")));
        }

        Ok(())
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            container_selector: self.selectors.container.clone(),
            post_selector: self.selectors.post.clone(),
            button_selector: self.selectors.button.clone(),
            target_count: self.target_count,
            poll_interval: secs(self.poll_interval_secs),
            click_settle: secs(self.click_settle_secs),
            wait: RetryPolicy::polling(secs(self.timeout_secs), secs(self.wait_poll_secs))
                .with_jitter(secs(self.wait_jitter_secs)),
            max_clicks: self.max_clicks,
        }
    }

    pub fn extractor_settings(&self) -> ExtractorSettings {
        ExtractorSettings {
            container_selector: self.selectors.container.clone(),
            title_selector: self.selectors.title.clone(),
            excerpt_selector: self.selectors.excerpt.clone(),
            dedupe_titles: self.dedupe_titles,
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}
