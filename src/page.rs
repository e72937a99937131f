//! The page capability the scraper drives.
//!
//! [`Page`] exposes exactly the DOM operations the loader and extractor
//! need. [`crate::browser::BrowserSession`] implements it on top of headless
//! Chrome; tests use [`fake::FakePage`], so neither component needs a real
//! browser to be exercised.

use crate::retry::RetryPolicy;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while driving a page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out after {attempts} attempts waiting for {selector} to be {condition}")]
    Timeout {
        selector: String,
        condition: &'static str,
        attempts: usize,
    },

    #[error("JavaScript execution error: {0}")]
    Script(String),
}

/// DOM operations used by the scraper, addressed by CSS selector.
///
/// Every method acts on the first element matching the selector.
pub trait Page {
    /// Whether an element matching `selector` exists.
    fn is_present(&self, selector: &str) -> Result<bool, PageError>;

    /// Whether the element exists, is displayed and is enabled.
    fn is_clickable(&self, selector: &str) -> Result<bool, PageError>;

    /// Count the direct children of `container` that match `item`.
    ///
    /// Returns [`PageError::ElementNotFound`] when the container is absent.
    fn count_children(&self, container: &str, item: &str) -> Result<usize, PageError>;

    /// Rendered inner markup of the element.
    fn inner_html(&self, selector: &str) -> Result<String, PageError>;

    fn scroll_into_view(&self, selector: &str) -> Result<(), PageError>;

    /// Programmatic click (`element.click()`), without simulated pointer input.
    fn click(&self, selector: &str) -> Result<(), PageError>;
}

/// Block until an element matching `selector` exists.
pub fn wait_until_present<P>(page: &P, selector: &str, policy: &RetryPolicy) -> Result<(), PageError>
where
    P: Page + ?Sized,
{
    wait_for(selector, "present", policy, || page.is_present(selector))
}

/// Block until the element matching `selector` can be clicked.
pub fn wait_until_clickable<P>(page: &P, selector: &str, policy: &RetryPolicy) -> Result<(), PageError>
where
    P: Page + ?Sized,
{
    wait_for(selector, "clickable", policy, || page.is_clickable(selector))
}

fn wait_for<F>(
    selector: &str,
    condition: &'static str,
    policy: &RetryPolicy,
    mut probe: F,
) -> Result<(), PageError>
where
    F: FnMut() -> Result<bool, PageError>,
{
    // A failing probe is treated like "not yet".
    let result = policy.poll_until(|| match probe() {
        Ok(ready) => ready,
        Err(e) => {
            debug!(%selector, condition, error = %e, "probe failed");
            false
        }
    });

    if result.satisfied {
        debug!(%selector, condition, attempts = result.attempts, elapsed_ms = result.elapsed.as_millis() as u64, "wait satisfied");
        Ok(())
    } else {
        Err(PageError::Timeout {
            selector: selector.to_string(),
            condition,
            attempts: result.attempts,
        })
    }
}

#[cfg(test)]
pub mod fake {
    //! In-memory [`Page`] with a counter of posts and a load-more button.

    use super::{Page, PageError};
    use std::cell::Cell;

    pub struct FakePage {
        posts: Cell<usize>,
        per_click: usize,
        container_present: bool,
        button_present: bool,
        button_clickable: bool,
        click_fails: bool,
        markup: Option<String>,
        pub clicks: Cell<usize>,
        pub scrolls: Cell<usize>,
        pub clickable_probes: Cell<usize>,
    }

    impl FakePage {
        /// A page showing `initial` posts, where each click appends `per_click` more.
        pub fn new(initial: usize, per_click: usize) -> Self {
            Self {
                posts: Cell::new(initial),
                per_click,
                container_present: true,
                button_present: true,
                button_clickable: true,
                click_fails: false,
                markup: None,
                clicks: Cell::new(0),
                scrolls: Cell::new(0),
                clickable_probes: Cell::new(0),
            }
        }

        pub fn without_button(mut self) -> Self {
            self.button_present = false;
            self
        }

        pub fn with_stuck_button(mut self) -> Self {
            self.button_clickable = false;
            self
        }

        pub fn without_container(mut self) -> Self {
            self.container_present = false;
            self
        }

        pub fn with_failing_click(mut self) -> Self {
            self.click_fails = true;
            self
        }

        pub fn with_markup(mut self, markup: &str) -> Self {
            self.markup = Some(markup.to_string());
            self
        }

        pub fn posts(&self) -> usize {
            self.posts.get()
        }
    }

    impl Page for FakePage {
        fn is_present(&self, _selector: &str) -> Result<bool, PageError> {
            Ok(self.button_present)
        }

        fn is_clickable(&self, _selector: &str) -> Result<bool, PageError> {
            self.clickable_probes.set(self.clickable_probes.get() + 1);
            Ok(self.button_present && self.button_clickable)
        }

        fn count_children(&self, container: &str, _item: &str) -> Result<usize, PageError> {
            if self.container_present {
                Ok(self.posts.get())
            } else {
                Err(PageError::ElementNotFound(container.to_string()))
            }
        }

        fn inner_html(&self, selector: &str) -> Result<String, PageError> {
            match (&self.markup, self.container_present) {
                (Some(markup), true) => Ok(markup.clone()),
                _ => Err(PageError::ElementNotFound(selector.to_string())),
            }
        }

        fn scroll_into_view(&self, selector: &str) -> Result<(), PageError> {
            if !self.button_present {
                return Err(PageError::ElementNotFound(selector.to_string()));
            }
            self.scrolls.set(self.scrolls.get() + 1);
            Ok(())
        }

        fn click(&self, _selector: &str) -> Result<(), PageError> {
            if self.click_fails {
                return Err(PageError::Script("element is detached".to_string()));
            }
            self.clicks.set(self.clicks.get() + 1);
            self.posts.set(self.posts.get() + self.per_click);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakePage;
    use super::*;
    use std::time::Duration;

    fn quick_policy(attempts: usize) -> RetryPolicy {
        RetryPolicy::polling(Duration::from_millis(attempts as u64), Duration::from_millis(1))
    }

    #[test]
    fn test_wait_until_present_succeeds_immediately() {
        let page = FakePage::new(0, 1);
        assert!(wait_until_present(&page, ".cc-button", &quick_policy(3)).is_ok());
    }

    #[test]
    fn test_wait_until_present_times_out() {
        let page = FakePage::new(0, 1).without_button();
        let err = wait_until_present(&page, ".cc-button", &quick_policy(3)).unwrap_err();
        match err {
            PageError::Timeout {
                selector,
                condition,
                attempts,
            } => {
                assert_eq!(selector, ".cc-button");
                assert_eq!(condition, "present");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wait_until_clickable_probes_every_attempt() {
        let page = FakePage::new(0, 1).with_stuck_button();
        assert!(wait_until_clickable(&page, ".cc-button", &quick_policy(5)).is_err());
        assert_eq!(page.clickable_probes.get(), 5);
    }

    #[test]
    fn test_probe_errors_count_as_not_ready() {
        let policy = quick_policy(2);
        let mut calls = 0;
        let result = wait_for(".x", "present", &policy, || {
            calls += 1;
            Err(PageError::Script("boom".to_string()))
        });
        assert!(matches!(result, Err(PageError::Timeout { attempts: 2, .. })));
        assert_eq!(calls, 2);
    }
}
