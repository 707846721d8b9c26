//! Polling waits.
//!
//! Every wait in the harness goes through [`poll`]: an async probe is
//! evaluated until it yields a value, fails hard, or the deadline passes.
//! Named [`Condition`]s supply the descriptions used in timeout errors.

use crate::driver::ElementHandle;
use crate::result::{WayfinderError, WayfinderResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// Named wait conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The browser has left its blank start page
    BrowserReady,
    /// The current URL resolves to the named page
    PageMatches(String),
    /// A compound id resolves against the current page object
    ConfiguredInPage(String),
    /// A selector matches an element
    FoundInPage(String),
    /// A selector matches no element
    NotFoundInPage(String),
    /// The page title equals the text
    TitleIs(String),
    /// The element accepts input
    ElementEnabled(ElementHandle),
    /// The element is displayed
    ElementVisible(ElementHandle),
    /// The element is not displayed
    ElementHidden(ElementHandle),
    /// The element's visible text equals the text
    ElementTextIs(ElementHandle, String),
}

impl Condition {
    /// Human-readable description, used in timeout errors
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::BrowserReady => "for url to not be blank".to_string(),
            Self::PageMatches(page) => format!("for page to match \"{page}\""),
            Self::ConfiguredInPage(id) => format!("for \"{id}\" to be configured in page"),
            Self::FoundInPage(selector) => format!("for $(\"{selector}\") to be found in page"),
            Self::NotFoundInPage(selector) => {
                format!("for $(\"{selector}\") to not be found in page")
            }
            Self::TitleIs(title) => format!("for \"{title}\" to match page title"),
            Self::ElementEnabled(el) => format!("for $(\"{}\") to be enabled", el.selector),
            Self::ElementVisible(el) => format!("for $(\"{}\") to be visible", el.selector),
            Self::ElementHidden(el) => format!("for $(\"{}\") to be hidden", el.selector),
            Self::ElementTextIs(el, text) => {
                format!("for $(\"{}\") to have text \"{text}\"", el.selector)
            }
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value the probe yielded
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of probe evaluations
    pub attempts: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `probe` until it yields a value.
///
/// - `Ok(Some(v))` ends the wait with `v`.
/// - `Ok(None)` means "not yet": sleep one interval (never past the
///   deadline) and probe again.
/// - `Err(e)` aborts the wait with `e`.
///
/// A probe still running at the deadline is dropped. The wait fails with
/// [`WayfinderError::Timeout`] once the deadline has passed.
pub async fn poll<T, F, Fut>(
    description: &str,
    options: &WaitOptions,
    mut probe: F,
) -> WayfinderResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = WayfinderResult<Option<T>>>,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match tokio::time::timeout_at(deadline, probe()).await {
            Ok(Ok(Some(value))) => {
                debug!(waited_for = description, attempts, "wait satisfied");
                return Ok(WaitResult {
                    value,
                    elapsed: start.elapsed(),
                    attempts,
                    waited_for: description.to_string(),
                });
            }
            Ok(Ok(None)) => {}
            Ok(Err(err)) => return Err(err),
            Err(_) => break,
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        tokio::time::sleep(options.poll_interval().min(deadline - now)).await;
    }

    debug!(waited_for = description, attempts, "wait timed out");
    Err(WayfinderError::Timeout {
        description: description.to_string(),
        ms: options.timeout_ms,
        html: None,
    })
}

/// Poll a boolean probe until it holds
pub async fn poll_until<F, Fut>(
    description: &str,
    options: &WaitOptions,
    mut probe: F,
) -> WayfinderResult<WaitResult<()>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = WayfinderResult<bool>>,
{
    poll(description, options, || {
        let check = probe();
        async move {
            let holds = check.await?;
            Ok::<_, WayfinderError>(holds.then_some(()))
        }
    })
    .await
}
