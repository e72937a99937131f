//! Data models shared by the scraper stages.
//!
//! - [`Post`]: one news-listing entry, as written to the JSON output
//! - [`LoadOutcome`]: how the incremental load loop ended
//!
//! `Post` serializes with capitalized keys (`Title`, `Description`) to keep
//! the output format consumers already rely on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single news-listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Trimmed text of the post heading. Never empty.
    #[serde(rename = "Title")]
    pub title: String,
    /// Trimmed text of the post excerpt.
    #[serde(rename = "Description")]
    pub description: String,
}

impl Post {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// The way the load-more loop terminated.
///
/// Every variant records the number of posts visible when the loop stopped
/// and how many times the button was clicked. None of them is fatal:
/// extraction always runs on whatever was loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The visible post count exceeded the target.
    TargetReached { count: usize, clicks: usize },
    /// The load-more button never appeared.
    ButtonMissing { count: usize },
    /// The button stopped becoming clickable within the wait policy.
    NotClickable { count: usize, clicks: usize },
    /// The click budget ran out before the target was reached.
    ClickLimit { count: usize, clicks: usize },
    /// Scrolling or clicking raised an error.
    Failed {
        count: usize,
        clicks: usize,
        reason: String,
    },
}

impl LoadOutcome {
    pub fn count(&self) -> usize {
        match self {
            Self::TargetReached { count, .. }
            | Self::ButtonMissing { count }
            | Self::NotClickable { count, .. }
            | Self::ClickLimit { count, .. }
            | Self::Failed { count, .. } => *count,
        }
    }

    pub fn clicks(&self) -> usize {
        match self {
            Self::ButtonMissing { .. } => 0,
            Self::TargetReached { clicks, .. }
            | Self::NotClickable { clicks, .. }
            | Self::ClickLimit { clicks, .. }
            | Self::Failed { clicks, .. } => *clicks,
        }
    }

    /// `true` only when the target was reached.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::TargetReached { .. })
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetReached { .. } => f.write_str("target reached"),
            Self::ButtonMissing { .. } => f.write_str("load-more button not found"),
            Self::NotClickable { .. } => f.write_str("load-more button not clickable"),
            Self::ClickLimit { .. } => f.write_str("click limit reached"),
            Self::Failed { reason, .. } => write!(f, "load failed: {reason}"),
        }
    }
}
