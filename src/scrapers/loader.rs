//! Incremental loader for "load more" listings.
//!
//! The listing shows a first batch of posts inside a container and appends
//! more each time the load-more button is clicked. [`load_until`] keeps
//! clicking until the container holds more than `target_count` posts.
//!
//! # Termination
//!
//! The loop stops on the first of:
//! - the visible count exceeding the target
//! - the button never appearing, or never becoming clickable, within the
//!   wait policy
//! - `max_clicks` clicks having been issued
//! - a scroll or click error

use crate::models::LoadOutcome;
use crate::page::{wait_until_clickable, wait_until_present, Page};
use crate::retry::RetryPolicy;
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Selectors, thresholds and timings for [`load_until`].
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    /// Element holding the posts.
    pub container_selector: String,
    /// Selector a direct child of the container must match to count as a post.
    pub post_selector: String,
    pub button_selector: String,
    /// Clicking stops once more than this many posts are visible.
    pub target_count: usize,
    /// Pause after scrolling the button into view.
    pub poll_interval: Duration,
    /// Pause after each click so new posts can render.
    pub click_settle: Duration,
    /// Policy for waiting on the button to appear or become clickable.
    pub wait: RetryPolicy,
    /// Hard cap on the number of clicks.
    pub max_clicks: usize,
}

/// Count the posts currently inside the container.
///
/// A failed lookup (typically the container not being rendered yet) counts
/// as zero posts.
pub fn count_posts<P>(page: &P, container: &str, post: &str) -> usize
where
    P: Page + ?Sized,
{
    match page.count_children(container, post) {
        Ok(count) => count,
        Err(e) => {
            warn!(%container, error = %e, "Could not count posts; assuming none");
            0
        }
    }
}

/// Click the load-more button until the listing holds more than
/// `settings.target_count` posts.
#[instrument(level = "info", skip_all, fields(target = settings.target_count, button = %settings.button_selector))]
pub fn load_until<P>(page: &P, settings: &LoaderSettings) -> LoadOutcome
where
    P: Page + ?Sized,
{
    info!("Loading posts");
    let current_count = || count_posts(page, &settings.container_selector, &settings.post_selector);

    if let Err(e) = wait_until_present(page, &settings.button_selector, &settings.wait) {
        warn!(error = %e, "Load-more button never appeared");
        return LoadOutcome::ButtonMissing {
            count: current_count(),
        };
    }

    let mut clicks = 0usize;
    loop {
        let count = current_count();
        if count > settings.target_count {
            info!(count, clicks, "Post target reached");
            return LoadOutcome::TargetReached { count, clicks };
        }

        if clicks >= settings.max_clicks {
            warn!(count, clicks, max_clicks = settings.max_clicks, "Click limit reached before post target");
            return LoadOutcome::ClickLimit { count, clicks };
        }

        if let Err(e) = page.scroll_into_view(&settings.button_selector) {
            warn!(count, clicks, error = %e, "Failed to scroll load-more button into view");
            return LoadOutcome::Failed {
                count,
                clicks,
                reason: e.to_string(),
            };
        }
        sleep(settings.poll_interval);

        if let Err(e) = wait_until_clickable(page, &settings.button_selector, &settings.wait) {
            warn!(count, clicks, error = %e, "Load-more button is not clickable");
            return LoadOutcome::NotClickable { count, clicks };
        }

        if let Err(e) = page.click(&settings.button_selector) {
            warn!(count, clicks, error = %e, "Failed to click load-more button");
            return LoadOutcome::Failed {
                count,
                clicks,
                reason: e.to_string(),
            };
        }
        clicks += 1;
        debug!(count, clicks, "Clicked load-more button");
        sleep(settings.click_settle);
    }
}
