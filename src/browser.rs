//! Headless Chrome session.
//!
//! [`BrowserSession`] owns the Chrome process and the single tab the scrape
//! runs in, and implements [`Page`] by evaluating small JavaScript snippets
//! in that tab. The process is torn down when the session is closed or
//! dropped, whichever comes first, so an early return or a panic in the
//! scrape still releases it.

use crate::config::BrowserSettings;
use crate::page::{Page, PageError};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A running browser with one open tab.
pub struct BrowserSession {
    tab: Arc<Tab>,
    // Dropped after `tab`; dropping it kills the Chrome process.
    browser: Browser,
    closed: bool,
}

impl BrowserSession {
    /// Launch Chrome and open a tab.
    ///
    /// In headless mode the GPU, the sandbox and `/dev/shm` usage are
    /// disabled so Chrome starts in containers and CI runners.
    #[instrument(level = "info", skip_all, fields(headless = settings.headless))]
    pub fn open(settings: &BrowserSettings) -> Result<Self, PageError> {
        let options = Self::build_launch_options(settings)?;

        let browser = Browser::new(options).map_err(|e| PageError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| PageError::Launch(format!("failed to open tab: {e}")))?;

        info!("Browser session opened");
        Ok(Self {
            tab,
            browser,
            closed: false,
        })
    }

    fn build_launch_options(settings: &BrowserSettings) -> Result<LaunchOptions<'static>, PageError> {
        let mut args: Vec<&'static OsStr> = Vec::new();
        if settings.headless {
            args.push(OsStr::new("--disable-gpu"));
            args.push(OsStr::new("--disable-dev-shm-usage"));
        }

        LaunchOptions::default_builder()
            .headless(settings.headless)
            .sandbox(!settings.headless)
            .window_size(Some(settings.window_size))
            .path(settings.chrome_path.clone())
            .args(args)
            .build()
            .map_err(|e| PageError::Launch(format!("invalid launch options: {e}")))
    }

    /// Load `url` and wait for the navigation to finish.
    #[instrument(level = "info", skip(self))]
    pub fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| PageError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        info!("Page loaded");
        Ok(())
    }

    /// Close the tab and shut the browser down.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.tab.close(true) {
            debug!(error = %e, "Tab close failed; the browser process is stopped anyway");
        }
        info!(pid = ?self.browser.get_process_id(), "Browser session closed");
    }

    /// Evaluate an expression and return its primitive value (`Null` when
    /// the expression yields `null` or `undefined`).
    fn eval(&self, script: &str) -> Result<Value, PageError> {
        let object = self
            .tab
            .evaluate(script, false)
            .map_err(|e| PageError::Script(e.to_string()))?;
        Ok(object.value.unwrap_or(Value::Null))
    }

    /// Evaluate a snippet that returns `false` when the element is missing.
    fn eval_on_element(&self, selector: &str, script: &str) -> Result<(), PageError> {
        match self.eval(script)? {
            Value::Bool(true) => Ok(()),
            _ => Err(PageError::ElementNotFound(selector.to_string())),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Browser session dropped without close(); shutting down");
            self.shutdown();
        }
    }
}

/// Quote a selector as a JavaScript string literal.
fn js_string(value: &str) -> String {
    // A JSON string is a valid JS string literal.
    Value::String(value.to_string()).to_string()
}

impl Page for BrowserSession {
    fn is_present(&self, selector: &str) -> Result<bool, PageError> {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        Ok(self.eval(&script)?.as_bool().unwrap_or(false))
    }

    fn is_clickable(&self, selector: &str) -> Result<bool, PageError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el || el.disabled) return false;
                const style = window.getComputedStyle(el);
                if (style.display === 'none' || style.visibility === 'hidden') return false;
                return el.getClientRects().length > 0;
            }})()"#,
            js_string(selector)
        );
        Ok(self.eval(&script)?.as_bool().unwrap_or(false))
    }

    fn count_children(&self, container: &str, item: &str) -> Result<usize, PageError> {
        let script = format!(
            r#"(() => {{
                const container = document.querySelector({});
                if (!container) return null;
                return Array.from(container.children).filter((child) => child.matches({})).length;
            }})()"#,
            js_string(container),
            js_string(item)
        );
        match self.eval(&script)? {
            Value::Number(n) => n
                .as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| PageError::Script(format!("unexpected count {n}"))),
            _ => Err(PageError::ElementNotFound(container.to_string())),
        }
    }

    fn inner_html(&self, selector: &str) -> Result<String, PageError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({});
                return el ? el.innerHTML : null;
            }})()"#,
            js_string(selector)
        );
        match self.eval(&script)? {
            Value::String(html) => Ok(html),
            _ => Err(PageError::ElementNotFound(selector.to_string())),
        }
    }

    fn scroll_into_view(&self, selector: &str) -> Result<(), PageError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el) return false;
                el.scrollIntoView();
                return true;
            }})()"#,
            js_string(selector)
        );
        self.eval_on_element(selector, &script)
    }

    fn click(&self, selector: &str) -> Result<(), PageError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el) return false;
                el.click();
                return true;
            }})()"#,
            js_string(selector)
        );
        self.eval_on_element(selector, &script)
    }
}
