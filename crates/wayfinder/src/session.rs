//! Test sessions.
//!
//! A [`Session`] is the surface step definitions talk to. Elements are named
//! by compound ids resolved against the page the browser is currently on;
//! every lookup waits for the id to be configured and for the element to
//! exist, and clicks and typing retry transient failures.
//!
//! ```ignore
//! let session = Session::from_config(ChromiumDriver::launch(opts).await?, config);
//! session.visit("login", &[] as &[&str]).await?;
//! session.send_keys("usernameField", "alice", 0, None).await?;
//! session.click("submitButton", 2, None).await?;
//! session.when_page_is("dashboard", None).await?;
//! ```

use crate::config::HarnessConfig;
use crate::config_tree::normalize_key;
use crate::driver::{BrowserDriver, ElementHandle, ABOUT_BLANK};
use crate::page_object::{PageObject, PageObjectResolver, BODY_SELECTOR};
use crate::result::{WayfinderError, WayfinderResult};
use crate::retry::{CheckOutcome, FixedAttempts};
use crate::route::Route;
use crate::routes::RouteRegistry;
use crate::wait::{poll, poll_until, Condition, WaitOptions};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Scrolls the window so the element matching `arguments[0]` sits near
/// the top, 100px in from the left edge.
pub const SCROLL_INTO_VIEW_SCRIPT: &str = r"
var el = document.querySelector(arguments[0]);
var left = 0;
var top = 0;
while (el && !isNaN(el.offsetLeft) && !isNaN(el.offsetTop)) {
    left += el.offsetLeft - el.scrollLeft;
    top += el.offsetTop - el.scrollTop;
    el = el.offsetParent;
}
window.scroll(left + 100, top);
";

/// A logical test session over one browser driver
pub struct Session<D: BrowserDriver> {
    id: Uuid,
    driver: Arc<D>,
    registry: Arc<RouteRegistry>,
    resolver: PageObjectResolver,
    config: HarnessConfig,
    current_page: Mutex<Option<PageObject>>,
    data: Mutex<BTreeMap<String, Value>>,
}

impl<D: BrowserDriver> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<D: BrowserDriver> Session<D> {
    /// Create a session with default configuration and an empty base page object
    #[must_use]
    pub fn new(driver: D, registry: Arc<RouteRegistry>) -> Self {
        Self::with_shared_driver(Arc::new(driver), registry)
    }

    /// Create a session over a driver shared with other owners
    #[must_use]
    pub fn with_shared_driver(driver: Arc<D>, registry: Arc<RouteRegistry>) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "session created");
        Self {
            id,
            driver,
            registry,
            resolver: PageObjectResolver::default(),
            config: HarnessConfig::default(),
            current_page: Mutex::new(None),
            data: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a session whose routes are discovered as `config` describes
    #[must_use]
    pub fn from_config(driver: D, config: HarnessConfig) -> Self {
        let registry = Arc::new(RouteRegistry::new(config.route_loader()));
        Self::new(driver, registry).with_config(config)
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the page object resolver (base tree and base helpers)
    #[must_use]
    pub fn with_resolver(mut self, resolver: PageObjectResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Session id
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The driver
    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The route registry
    #[must_use]
    pub const fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    /// The configuration
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Page object from the last resolution, if any
    #[must_use]
    pub fn current_page(&self) -> Option<PageObject> {
        lock(&self.current_page).clone()
    }

    fn options(&self, timeout_ms: Option<u64>) -> WaitOptions {
        self.config.wait_options(timeout_ms)
    }

    fn route_by_name(&self, page: &str) -> WayfinderResult<Arc<Route>> {
        self.registry
            .load()?
            .by_name(page)
            .ok_or_else(|| WayfinderError::RouteNotFound {
                page: page.to_string(),
            })
    }

    fn is_blank(&self, url: &str) -> bool {
        url == self.driver.blank_url() || url == ABOUT_BLANK
    }

    async fn ready_url(&self) -> WayfinderResult<Option<String>> {
        let url = self.driver.current_url().await?;
        Ok((!self.is_blank(&url)).then_some(url))
    }

    // =========================================================================
    // PAGE OBJECTS
    // =========================================================================

    /// Resolve the page object for the browser's current URL.
    ///
    /// Waits for the browser to leave its blank page first. The result is
    /// stored as the current page and never reused by later calls.
    #[instrument(level = "debug", skip_all, fields(session = %self.id))]
    pub async fn get_page_object(&self) -> WayfinderResult<PageObject> {
        let options = self.options(None);
        let url = poll(
            &Condition::BrowserReady.description(),
            &options,
            move || self.ready_url(),
        )
        .await?
        .value;

        let table = self.registry.load()?;
        let page = self.resolver.resolve_url(&table, &url)?;
        debug!(route = page.route().name(), path = page.path(), "page object resolved");
        *lock(&self.current_page) = Some(page.clone());
        Ok(page)
    }

    /// Resolve the current page and invoke one of its helpers
    #[instrument(level = "debug", skip_all, fields(session = %self.id, helper = name))]
    pub async fn call_helper(&self, name: &str, args: &[Value]) -> WayfinderResult<Value> {
        self.get_page_object().await?.call(name, args)
    }

    // =========================================================================
    // CONDITIONS
    // =========================================================================

    async fn holds(&self, condition: &Condition) -> WayfinderResult<bool> {
        match condition {
            Condition::BrowserReady => Ok(self.ready_url().await?.is_some()),
            Condition::PageMatches(page) => {
                let target = self.route_by_name(page)?;
                let current = self.get_page_object().await?;
                Ok(current.route().name() == target.name())
            }
            Condition::ConfiguredInPage(id) => {
                let page = self.get_page_object().await?;
                match page.resolve(id).map(|_| ()) {
                    Ok(()) => Ok(true),
                    Err(WayfinderError::PropertyNotFound { .. }) => Ok(false),
                    Err(err) => Err(err),
                }
            }
            Condition::FoundInPage(selector) => match self.driver.find_element(selector).await {
                Ok(_) => Ok(true),
                Err(err) if err.is_retryable() => Ok(false),
                Err(err) => Err(err),
            },
            Condition::NotFoundInPage(selector) => {
                match self.driver.find_element(selector).await {
                    Ok(_) => Ok(false),
                    Err(WayfinderError::ElementNotFound { .. }) => Ok(true),
                    Err(err) if err.is_retryable() => Ok(false),
                    Err(err) => Err(err),
                }
            }
            Condition::TitleIs(title) => Ok(self.driver.title().await? == *title),
            Condition::ElementEnabled(element) => self.driver.is_enabled(element).await,
            Condition::ElementVisible(element) => self.driver.is_displayed(element).await,
            // a detached element is not displayed
            Condition::ElementHidden(element) => match self.driver.is_displayed(element).await {
                Ok(displayed) => Ok(!displayed),
                Err(WayfinderError::StaleElement { .. }) => Ok(true),
                Err(err) => Err(err),
            },
            Condition::ElementTextIs(element, text) => {
                Ok(self.driver.text(element).await? == *text)
            }
        }
    }

    /// Wait until a condition holds.
    ///
    /// A [`Condition::ConfiguredInPage`] that times out reports the missing
    /// segment rather than the timeout.
    pub async fn wait_for(
        &self,
        condition: &Condition,
        timeout_ms: Option<u64>,
    ) -> WayfinderResult<()> {
        let options = self.options(timeout_ms);
        let description = condition.description();
        match poll_until(&description, &options, move || self.holds(condition)).await {
            Ok(_) => Ok(()),
            Err(timeout @ WayfinderError::Timeout { .. }) => {
                if let (Condition::ConfiguredInPage(id), Some(page)) =
                    (condition, self.current_page())
                {
                    page.resolve(id).map(|_| ())?;
                }
                Err(timeout)
            }
            Err(err) => Err(err),
        }
    }

    /// Wait for the browser to leave its blank page, returning the URL
    #[instrument(level = "debug", skip_all, fields(session = %self.id))]
    pub async fn when_browser_ready(&self, timeout_ms: Option<u64>) -> WayfinderResult<String> {
        self.wait_for(&Condition::BrowserReady, timeout_ms).await?;
        self.driver.current_url().await
    }

    /// Wait for the current URL to resolve to the named page
    #[instrument(level = "debug", skip_all, fields(session = %self.id, page = %page))]
    pub async fn when_page_is(&self, page: &str, timeout_ms: Option<u64>) -> WayfinderResult<()> {
        self.wait_for(&Condition::PageMatches(page.to_string()), timeout_ms)
            .await
    }

    /// Wait for the page title
    #[instrument(level = "debug", skip_all, fields(session = %self.id))]
    pub async fn when_title_is(&self, title: &str, timeout_ms: Option<u64>) -> WayfinderResult<()> {
        self.wait_for(&Condition::TitleIs(title.to_string()), timeout_ms)
            .await
    }

    // =========================================================================
    // FINDING
    // =========================================================================

    async fn selector_for(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<String> {
        if id.is_empty() {
            return Ok(BODY_SELECTOR.to_string());
        }
        self.wait_for(&Condition::ConfiguredInPage(id.to_string()), timeout_ms)
            .await?;
        match self.current_page() {
            Some(page) => page.selector(id),
            None => self.get_page_object().await?.selector(id),
        }
    }

    /// Find the element named by a compound id on the current page.
    ///
    /// An empty id finds the document body.
    #[instrument(level = "debug", skip_all, fields(session = %self.id, id = %id))]
    pub async fn find(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<ElementHandle> {
        let selector = self.selector_for(id, timeout_ms).await?;
        self.wait_for(&Condition::FoundInPage(selector.clone()), timeout_ms)
            .await?;
        self.driver.find_element(&selector).await
    }

    /// Wait until the element named by a compound id is absent
    #[instrument(level = "debug", skip_all, fields(session = %self.id, id = %id))]
    pub async fn not_find(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<()> {
        let selector = self.selector_for(id, timeout_ms).await?;
        self.wait_for(&Condition::NotFoundInPage(selector), timeout_ms)
            .await
    }

    async fn annotate_element(&self, err: WayfinderError, element: &ElementHandle) -> WayfinderError {
        if err.html().is_some() {
            return err;
        }
        match self.driver.outer_html(element).await {
            Ok(html) => err.with_html(html),
            Err(_) => err,
        }
    }

    async fn annotate_id(&self, err: WayfinderError, id: &str) -> WayfinderError {
        if !err.is_retryable() {
            return err;
        }
        let selector = if id.is_empty() {
            Some(BODY_SELECTOR.to_string())
        } else {
            self.current_page().and_then(|page| page.selector(id).ok())
        };
        let Some(selector) = selector else {
            return err;
        };
        match self.driver.find_element(&selector).await {
            Ok(element) => self.annotate_element(err, &element).await,
            Err(_) => err,
        }
    }

    async fn wait_states(
        &self,
        element: &ElementHandle,
        conditions: &[Condition],
        timeout_ms: Option<u64>,
    ) -> WayfinderResult<()> {
        for condition in conditions {
            if let Err(err) = self.wait_for(condition, timeout_ms).await {
                return Err(self.annotate_element(err, element).await);
            }
        }
        Ok(())
    }

    async fn find_usable(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<ElementHandle> {
        let element = self.find(id, timeout_ms).await?;
        self.wait_states(
            &element,
            &[
                Condition::ElementEnabled(element.clone()),
                Condition::ElementVisible(element.clone()),
            ],
            timeout_ms,
        )
        .await?;
        Ok(element)
    }

    // =========================================================================
    // INTERACTIONS
    // =========================================================================

    async fn interact<F, Fut>(
        &self,
        action: &str,
        id: &str,
        retries: u32,
        timeout_ms: Option<u64>,
        act: F,
    ) -> WayfinderResult<()>
    where
        F: Fn(ElementHandle) -> Fut,
        Fut: Future<Output = WayfinderResult<()>>,
    {
        let act = &act;
        let result = self
            .config
            .retry_policy(retries)
            .run(
                action,
                move || async move {
                    let element = self.find_usable(id, timeout_ms).await?;
                    act(element).await
                },
                move || async move { self.scroll_to(id, timeout_ms).await.map(|_| ()) },
            )
            .await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(self.annotate_id(err, id).await),
        }
    }

    /// Click an element, retrying transient failures up to `retries` times
    #[instrument(level = "debug", skip_all, fields(session = %self.id, id = %id, retries = retries))]
    pub async fn click(&self, id: &str, retries: u32, timeout_ms: Option<u64>) -> WayfinderResult<()> {
        self.interact("click", id, retries, timeout_ms, |element| async move {
            self.driver.click(&element).await
        })
        .await
    }

    /// Type into an element, retrying transient failures up to `retries` times
    #[instrument(level = "debug", skip_all, fields(session = %self.id, id = %id, retries = retries))]
    pub async fn send_keys(
        &self,
        id: &str,
        text: &str,
        retries: u32,
        timeout_ms: Option<u64>,
    ) -> WayfinderResult<()> {
        self.interact("send keys", id, retries, timeout_ms, |element| async move {
            self.driver.send_keys(&element, text).await
        })
        .await
    }

    /// Scroll the window to an element
    #[instrument(level = "debug", skip_all, fields(session = %self.id, id = %id))]
    pub async fn scroll_to(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<ElementHandle> {
        let element = self.find(id, timeout_ms).await?;
        let _ = self
            .driver
            .execute_script(
                SCROLL_INTO_VIEW_SCRIPT,
                vec![Value::String(element.selector.clone())],
            )
            .await?;
        Ok(element)
    }

    /// Move the pointer over an element, then pause for `delay_ms`
    #[instrument(level = "debug", skip_all, fields(session = %self.id, id = %id))]
    pub async fn hover(
        &self,
        id: &str,
        delay_ms: u64,
        timeout_ms: Option<u64>,
    ) -> WayfinderResult<ElementHandle> {
        let element = self.find_usable(id, timeout_ms).await?;
        self.driver.hover(&element).await?;
        self.sleep(delay_ms).await;
        Ok(element)
    }

    /// Visible text of an element
    pub async fn get_text(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<String> {
        let element = self.find_usable(id, timeout_ms).await?;
        self.driver.text(&element).await
    }

    /// Value of an input element
    pub async fn get_val(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<Option<String>> {
        let element = self.find_usable(id, timeout_ms).await?;
        self.driver.attribute(&element, "value").await
    }

    /// Outer HTML of an element
    pub async fn get_html(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<String> {
        let element = self.find(id, timeout_ms).await?;
        self.driver.outer_html(&element).await
    }

    /// Wait for an element to be enabled and visible
    #[instrument(level = "debug", skip_all, fields(session = %self.id, id = %id))]
    pub async fn when_visible(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<()> {
        self.find_usable(id, timeout_ms).await.map(|_| ())
    }

    /// Wait for an element to be enabled and hidden
    #[instrument(level = "debug", skip_all, fields(session = %self.id, id = %id))]
    pub async fn when_hidden(&self, id: &str, timeout_ms: Option<u64>) -> WayfinderResult<()> {
        let element = self.find(id, timeout_ms).await?;
        // an element detached while waiting counts as hidden
        match self
            .wait_for(&Condition::ElementEnabled(element.clone()), timeout_ms)
            .await
        {
            Ok(()) | Err(WayfinderError::StaleElement { .. }) => {}
            Err(err) => return Err(self.annotate_element(err, &element).await),
        }
        self.wait_states(&element, &[Condition::ElementHidden(element.clone())], timeout_ms)
            .await
    }

    /// Wait for an element's visible text to equal `text`
    #[instrument(level = "debug", skip_all, fields(session = %self.id, id = %id))]
    pub async fn when_text_matches(
        &self,
        id: &str,
        text: &str,
        timeout_ms: Option<u64>,
    ) -> WayfinderResult<()> {
        let element = self.find_usable(id, timeout_ms).await?;
        self.wait_states(
            &element,
            &[Condition::ElementTextIs(element.clone(), text.to_string())],
            timeout_ms,
        )
        .await
    }

    // =========================================================================
    // ASSERTIONS
    // =========================================================================

    /// Check the page title, three times 300ms apart
    #[instrument(level = "debug", skip_all, fields(session = %self.id))]
    pub async fn expect_page_title(&self, expected: &str) -> WayfinderResult<()> {
        let outcome = FixedAttempts::TITLE
            .run(move || async move {
                let title = self.driver.title().await?;
                Ok::<_, WayfinderError>(if title == expected {
                    CheckOutcome::Pass
                } else {
                    CheckOutcome::Fail(format!(
                        "expected page title \"{expected}\" but was \"{title}\""
                    ))
                })
            })
            .await?;
        match outcome {
            CheckOutcome::Pass => Ok(()),
            CheckOutcome::Fail(message) => Err(WayfinderError::AssertionFailed { message }),
        }
    }

    /// Assert the element named by `id` is on the page
    pub async fn expect_page_to_contain(
        &self,
        id: &str,
        timeout_ms: Option<u64>,
    ) -> WayfinderResult<()> {
        match self.find(id, timeout_ms).await {
            Ok(_) => Ok(()),
            Err(WayfinderError::Timeout { .. }) => Err(WayfinderError::AssertionFailed {
                message: format!("Element not found: \"{id}\""),
            }),
            Err(err) => Err(err),
        }
    }

    /// Assert the element named by `id` is not on the page
    pub async fn expect_page_to_not_contain(
        &self,
        id: &str,
        timeout_ms: Option<u64>,
    ) -> WayfinderResult<()> {
        match self.not_find(id, timeout_ms).await {
            Ok(()) => Ok(()),
            Err(WayfinderError::Timeout { .. }) => Err(WayfinderError::AssertionFailed {
                message: format!("Element unexpectedly found: \"{id}\""),
            }),
            Err(err) => Err(err),
        }
    }

    // =========================================================================
    // NAVIGATION AND BROWSER
    // =========================================================================

    /// URL `visit` would navigate to
    pub fn href<S: AsRef<str>>(&self, page: &str, params: &[S]) -> WayfinderResult<String> {
        let route = self.route_by_name(page)?;
        let path = route
            .href(params, self.config.empty_params_path)
            .ok_or_else(|| WayfinderError::NoMatchingPath {
                page: page.to_string(),
                params: params.len(),
            })?;
        Ok(self.config.url_for(&path))
    }

    /// Navigate to a page by name, substituting `params` into its path
    #[instrument(level = "debug", skip_all, fields(session = %self.id, page = %page))]
    pub async fn visit<S: AsRef<str>>(&self, page: &str, params: &[S]) -> WayfinderResult<()> {
        let url = self.href(page, params)?;
        info!(page, url = %url, "visiting");
        self.driver.navigate(&url).await
    }

    /// Resize the browser window
    pub async fn set_size(&self, width: u32, height: u32) -> WayfinderResult<()> {
        self.driver.set_window_size(width, height).await
    }

    /// Pause the session
    pub async fn sleep(&self, delay_ms: u64) {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    /// Run a script in the page
    pub async fn execute_script(&self, script: &str, args: Vec<Value>) -> WayfinderResult<Value> {
        self.driver.execute_script(script, args).await
    }

    // =========================================================================
    // SCRATCH DATA
    // =========================================================================

    /// Stored value for a key
    #[must_use]
    pub fn get_data(&self, key: &str) -> Option<Value> {
        lock(&self.data).get(&normalize_key(key)).cloned()
    }

    /// Store a value, returning it
    pub fn set_data(&self, key: &str, value: Value) -> Value {
        let _ = lock(&self.data).insert(normalize_key(key), value.clone());
        value
    }

    /// Whether a value is stored for a key
    #[must_use]
    pub fn has_data(&self, key: &str) -> bool {
        lock(&self.data).contains_key(&normalize_key(key))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
