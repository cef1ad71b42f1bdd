//! Headless browser fetch.
//!
//! # Flow
//! ```text
//! launch isolated Chrome (proxy endpoint, certificate errors ignored)
//!     → register proxy credentials for the auth challenge
//!     → navigate (short timeout on the round trip only) → fullscreen
//!     → wait for load and a stable DOM (settle budget) → sleep additional_delay
//!     → outerHTML of <html>
//! ```
//!
//! Every browser belongs to exactly one request and exits when its
//! [`BrowserGuard`] drops, on success, failure and cancellation alike.
//! The session runs on the blocking pool and checks the cancellation
//! token between steps and while sleeping.

use std::ffi::OsStr;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio_util::sync::CancellationToken;

use crate::config::BrowserConfig;
use crate::observability::metrics;
use crate::scrape::error::ScrapeError;
use crate::scrape::proxy::ProxyCredentials;
use crate::scrape::traits::RenderedFetch;

/// Polling slice used while sleeping so cancellation is noticed quickly.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Serialized length of the document once fully loaded, or -1 while loading.
const DOCUMENT_SIZE_JS: &str =
    "document.readyState === 'complete' ? document.documentElement.outerHTML.length : -1";

/// Renders pages in a fresh browser process per call.
#[derive(Debug, Clone)]
pub struct RenderedFetcher {
    browser: BrowserConfig,
    navigation_timeout: Duration,
}

impl RenderedFetcher {
    pub fn new(browser: BrowserConfig, navigation_timeout: Duration) -> Self {
        Self {
            browser,
            navigation_timeout,
        }
    }
}

#[async_trait::async_trait]
impl RenderedFetch for RenderedFetcher {
    async fn render(
        &self,
        url: &str,
        proxy: &ProxyCredentials,
        additional_delay: Duration,
        cancel: CancellationToken,
    ) -> Result<String, ScrapeError> {
        let session = RenderSession {
            browser: self.browser.clone(),
            navigation_timeout: self.navigation_timeout,
            url: url.to_string(),
            proxy: proxy.clone(),
            additional_delay,
            cancel: cancel.clone(),
        };

        let handle = tokio::task::spawn_blocking(move || session.run());

        // Losing the race detaches the blocking task; it sees the same token
        // at its next checkpoint and drops the browser.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScrapeError::Cancelled),
            joined = handle => joined
                .map_err(|e| ScrapeError::Internal(format!("render task failed: {e}")))?,
        }
    }
}

/// Owns a launched browser for one request. Dropping it drops the
/// `Browser`, which terminates the Chrome process, and records the teardown.
pub struct BrowserGuard {
    browser: Browser,
    launched_at: Instant,
}

impl BrowserGuard {
    fn launch(options: LaunchOptions<'_>) -> Result<Self, ScrapeError> {
        let browser = Browser::new(options)
            .map_err(|e| ScrapeError::Render(format!("failed to launch browser: {e}")))?;
        metrics::browser_launched();
        tracing::debug!("Browser launched");
        Ok(Self {
            browser,
            launched_at: Instant::now(),
        })
    }
}

impl Deref for BrowserGuard {
    type Target = Browser;

    fn deref(&self) -> &Browser {
        &self.browser
    }
}

impl Drop for BrowserGuard {
    fn drop(&mut self) {
        metrics::browser_closed();
        tracing::debug!(
            lifetime_ms = self.launched_at.elapsed().as_millis() as u64,
            "Browser torn down"
        );
    }
}

/// Build launch options for a browser bound to `proxy_endpoint`.
pub fn launch_options<'a>(
    config: &'a BrowserConfig,
    proxy_endpoint: &'a str,
) -> Result<LaunchOptions<'a>, ScrapeError> {
    let args: Vec<&OsStr> = config.extra_args.iter().map(OsStr::new).collect();

    LaunchOptions::default_builder()
        .path(config.chrome_path.as_ref().map(PathBuf::from))
        .headless(config.headless)
        .sandbox(config.sandbox)
        .window_size(Some((config.window_width, config.window_height)))
        .proxy_server(Some(proxy_endpoint))
        // Trust-everything policy for rendered sessions.
        .ignore_certificate_errors(true)
        .idle_browser_timeout(Duration::from_secs(config.idle_timeout_secs))
        .args(args)
        .build()
        .map_err(|e| ScrapeError::Render(format!("invalid browser options: {e}")))
}

struct RenderSession {
    browser: BrowserConfig,
    navigation_timeout: Duration,
    url: String,
    proxy: ProxyCredentials,
    additional_delay: Duration,
    cancel: CancellationToken,
}

impl RenderSession {
    fn run(self) -> Result<String, ScrapeError> {
        let options = launch_options(&self.browser, &self.proxy.endpoint)?;
        let browser = BrowserGuard::launch(options)?;
        self.checkpoint()?;

        let tab = browser.new_tab().map_err(render_error("failed to open tab"))?;

        // Credentials are answered by the browser's event loop when the
        // proxy challenges, independently of the navigation call below.
        tab.enable_fetch(None, Some(true))
            .map_err(render_error("failed to enable request interception"))?;
        tab.authenticate(
            Some(self.proxy.username.clone()),
            Some(self.proxy.password.clone()),
        )
        .map_err(render_error("failed to register proxy credentials"))?;

        // Only the navigate round trip is held to the navigation timeout.
        // Loading past that point counts against the settle budget.
        let nav_tab = Arc::clone(&tab);
        let url = self.url.clone();
        within(self.navigation_timeout, "navigation", move || {
            nav_tab.navigate_to(&url).map(|_| ())
        })?;
        self.checkpoint()?;

        if let Err(e) = tab.set_bounds(Bounds::Fullscreen) {
            tracing::warn!(error = %e, "Could not switch window to fullscreen");
        }

        let settle_deadline =
            Instant::now() + Duration::from_millis(self.browser.stable_timeout_ms);
        self.wait_loaded(&tab, settle_deadline);
        self.checkpoint()?;
        self.wait_stable(&tab, settle_deadline)?;
        sleep_cancellable(self.additional_delay, &self.cancel)?;

        tab.find_element("html")
            .and_then(|html| html.get_content())
            .map_err(render_error("failed to extract html"))
    }

    fn checkpoint(&self) -> Result<(), ScrapeError> {
        if self.cancel.is_cancelled() {
            Err(ScrapeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Wait for the frame to finish loading. A slow load is not an error;
    /// the stability wait and the request deadline bound it.
    fn wait_loaded(&self, tab: &Tab, deadline: Instant) {
        tab.set_default_timeout(deadline.saturating_duration_since(Instant::now()));
        if let Err(e) = tab.wait_until_navigated() {
            tracing::debug!(url = %self.url, error = %e, "Page still loading after settle budget");
        }
    }

    /// Wait until the loaded document stops changing size, bounded by
    /// `deadline`. Hitting the bound is not an error.
    fn wait_stable(&self, tab: &Tab, deadline: Instant) -> Result<(), ScrapeError> {
        let interval = Duration::from_millis(self.browser.stable_interval_ms);
        let mut tracker = StabilityTracker::default();

        loop {
            // A document torn down mid-load cannot be evaluated; treat it as loading.
            let sample = match tab.evaluate(DOCUMENT_SIZE_JS, false) {
                Ok(object) => object.value.and_then(|v| v.as_i64()).unwrap_or(-1),
                Err(e) => {
                    tracing::debug!(error = %e, "Document not ready for inspection");
                    -1
                }
            };

            if tracker.observe(sample) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                tracing::warn!(url = %self.url, "Page did not stabilize before timeout");
                return Ok(());
            }
            sleep_cancellable(interval, &self.cancel)?;
        }
    }
}

/// Decides stability from successive document-size samples: the document
/// must be loaded and two consecutive samples must agree.
#[derive(Debug, Default)]
pub struct StabilityTracker {
    last: Option<i64>,
}

impl StabilityTracker {
    /// Record a sample; returns true once the page is stable.
    pub fn observe(&mut self, size: i64) -> bool {
        if size < 0 {
            self.last = None;
            return false;
        }
        let stable = self.last == Some(size);
        self.last = Some(size);
        stable
    }
}

/// Sleep for `duration`, returning early with `Cancelled` if the token fires.
pub fn sleep_cancellable(duration: Duration, cancel: &CancellationToken) -> Result<(), ScrapeError> {
    let until = Instant::now() + duration;
    loop {
        if cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }
        let now = Instant::now();
        if now >= until {
            return Ok(());
        }
        std::thread::sleep(CANCEL_POLL.min(until - now));
    }
}

/// Run a blocking browser call on its own thread and give up after
/// `timeout`. An abandoned call ends when the browser is torn down.
pub fn within<T, F>(timeout: Duration, what: &'static str, call: F) -> Result<T, ScrapeError>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(call());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map_err(|e| ScrapeError::Render(format!("{what} failed: {e}"))),
        Err(_) => Err(ScrapeError::Render(format!(
            "{what} timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

fn render_error(context: &'static str) -> impl Fn(anyhow::Error) -> ScrapeError {
    move |e| ScrapeError::Render(format!("{context}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_options_bind_proxy_and_ignore_certificates() {
        let config = BrowserConfig::default();
        let options = launch_options(&config, "http://10.0.0.1:8080").unwrap();

        assert_eq!(options.proxy_server, Some("http://10.0.0.1:8080"));
        assert!(options.ignore_certificate_errors);
        assert_eq!(
            options.window_size,
            Some((config.window_width, config.window_height))
        );
        assert_eq!(options.args.len(), config.extra_args.len());
    }

    #[test]
    fn stability_needs_two_equal_loaded_samples() {
        let mut tracker = StabilityTracker::default();
        assert!(!tracker.observe(-1));
        assert!(!tracker.observe(120));
        assert!(!tracker.observe(180));
        assert!(tracker.observe(180));

        let mut tracker = StabilityTracker::default();
        assert!(!tracker.observe(50));
        assert!(!tracker.observe(-1));
        assert!(!tracker.observe(50));
    }

    #[test]
    fn bounded_call_returns_its_value() {
        let value = within(Duration::from_secs(1), "navigation", || Ok(7)).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn bounded_call_keeps_the_failure_message() {
        let err = within(Duration::from_secs(1), "navigation", || -> anyhow::Result<()> {
            anyhow::bail!("net::ERR_PROXY_CONNECTION_FAILED")
        })
        .unwrap_err();
        assert_eq!(
            err,
            ScrapeError::Render("navigation failed: net::ERR_PROXY_CONNECTION_FAILED".into())
        );
    }

    #[test]
    fn slow_call_times_out_without_waiting_for_it() {
        let started = Instant::now();
        let err = within(Duration::from_millis(50), "navigation", || {
            std::thread::sleep(Duration::from_secs(2));
            Ok(())
        })
        .unwrap_err();

        assert_eq!(err, ScrapeError::Render("navigation timed out after 50ms".into()));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_returns_early_when_cancelled() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let started = Instant::now();
        let result = sleep_cancellable(Duration::from_secs(10), &cancel);
        assert_eq!(result, Err(ScrapeError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn sleep_completes_without_cancellation() {
        let cancel = CancellationToken::new();
        let started = Instant::now();
        sleep_cancellable(Duration::from_millis(120), &cancel).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(120));
    }
}
