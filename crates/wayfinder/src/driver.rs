//! Browser driver boundary.
//!
//! The harness drives the browser only through [`BrowserDriver`]. Two
//! adapters ship with the crate: the scripted [`MockDriver`] used by unit
//! tests and, behind the `browser` feature, a chromiumoxide-backed driver.

use crate::result::{WayfinderError, WayfinderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// URL of a browser that has not navigated anywhere yet
pub const DEFAULT_BLANK_URL: &str = "data:,";

/// Blank page URL every driver treats as "not ready"
pub const ABOUT_BLANK: &str = "about:blank";

/// Element handle returned by [`BrowserDriver::find_element`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific element identifier
    pub id: String,
    /// CSS selector the element was found with
    pub selector: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            selector: selector.into(),
        }
    }
}

/// Remote browser driver.
///
/// Every method is one round-trip. Waiting and retrying are layered on top
/// by the session; drivers report failures immediately.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> WayfinderResult<()>;

    /// Current page URL
    async fn current_url(&self) -> WayfinderResult<String>;

    /// Current page title
    async fn title(&self) -> WayfinderResult<String>;

    /// First element matching a CSS selector, [`WayfinderError::ElementNotFound`] if none
    async fn find_element(&self, selector: &str) -> WayfinderResult<ElementHandle>;

    /// Click an element
    async fn click(&self, element: &ElementHandle) -> WayfinderResult<()>;

    /// Type text into an element
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> WayfinderResult<()>;

    /// Move the pointer over an element
    async fn hover(&self, element: &ElementHandle) -> WayfinderResult<()>;

    /// Visible text of an element
    async fn text(&self, element: &ElementHandle) -> WayfinderResult<String>;

    /// Attribute (or live property, for `value`) of an element
    async fn attribute(&self, element: &ElementHandle, name: &str)
        -> WayfinderResult<Option<String>>;

    /// Outer HTML of an element
    async fn outer_html(&self, element: &ElementHandle) -> WayfinderResult<String>;

    /// Whether an element accepts input
    async fn is_enabled(&self, element: &ElementHandle) -> WayfinderResult<bool>;

    /// Whether an element is rendered and visible
    async fn is_displayed(&self, element: &ElementHandle) -> WayfinderResult<bool>;

    /// Run a script in the page; `args` are exposed as `arguments`
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> WayfinderResult<Value>;

    /// Resize the browser window
    async fn set_window_size(&self, width: u32, height: u32) -> WayfinderResult<()>;

    /// URL of a browser that has not navigated yet
    fn blank_url(&self) -> &str {
        DEFAULT_BLANK_URL
    }
}

/// Scripted element state for [`MockDriver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Outer HTML
    pub html: String,
    /// Visible text
    pub text: String,
    /// Value property
    pub value: Option<String>,
    /// Other attributes
    pub attributes: BTreeMap<String, String>,
    /// Whether the element is displayed
    pub visible: bool,
    /// Whether the element is enabled
    pub enabled: bool,
    /// Number of queries that miss before the element appears
    pub appear_after: usize,
}

impl MockElement {
    /// A visible, enabled element
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            text: String::new(),
            value: None,
            attributes: BTreeMap::new(),
            visible: true,
            enabled: true,
            appear_after: 0,
        }
    }

    /// Set the visible text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the value property
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Mark as not displayed
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Miss the first `queries` lookups
    #[must_use]
    pub const fn appearing_after(mut self, queries: usize) -> Self {
        self.appear_after = queries;
        self
    }
}

#[derive(Debug)]
struct MockState {
    url: String,
    title: String,
    elements: BTreeMap<String, MockElement>,
    queries: BTreeMap<String, usize>,
    click_failures: Option<usize>,
    script_results: VecDeque<Value>,
    window: (u32, u32),
    call_history: Vec<String>,
    next_id: u64,
}

/// Mock driver for unit testing.
///
/// Starts on the blank URL with no elements. Clicks succeed unless
/// failures are scripted with [`MockDriver::fail_clicks`].
#[derive(Debug)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                url: DEFAULT_BLANK_URL.to_string(),
                title: String::new(),
                elements: BTreeMap::new(),
                queries: BTreeMap::new(),
                click_failures: Some(0),
                script_results: VecDeque::new(),
                window: (1280, 720),
                call_history: Vec::new(),
                next_id: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start on a URL
    #[must_use]
    pub fn with_url(self, url: &str) -> Self {
        self.set_url(url);
        self
    }

    /// Start with a page title
    #[must_use]
    pub fn with_title(self, title: &str) -> Self {
        self.set_title(title);
        self
    }

    /// Start with an element
    #[must_use]
    pub fn with_element(self, selector: &str, element: MockElement) -> Self {
        self.insert_element(selector, element);
        self
    }

    /// Change the current URL without recording a navigation
    pub fn set_url(&self, url: &str) {
        self.state().url = url.to_string();
    }

    /// Change the page title
    pub fn set_title(&self, title: &str) {
        self.state().title = title.to_string();
    }

    /// Add or replace an element
    pub fn insert_element(&self, selector: &str, element: MockElement) {
        let _ = self.state().elements.insert(selector.to_string(), element);
    }

    /// Remove an element
    pub fn remove_element(&self, selector: &str) {
        let _ = self.state().elements.remove(selector);
    }

    /// Mutate an element in place
    pub fn update_element(&self, selector: &str, f: impl FnOnce(&mut MockElement)) {
        if let Some(element) = self.state().elements.get_mut(selector) {
            f(element);
        }
    }

    /// Fail the next `count` clicks
    pub fn fail_clicks(&self, count: usize) {
        self.state().click_failures = Some(count);
    }

    /// Fail every click
    pub fn fail_clicks_always(&self) {
        self.state().click_failures = None;
    }

    /// Queue a result for the next script execution
    pub fn push_script_result(&self, result: Value) {
        self.state().script_results.push_back(result);
    }

    /// Current window size
    #[must_use]
    pub fn window_size(&self) -> (u32, u32) {
        self.state().window
    }

    /// Value property of an element
    #[must_use]
    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.state()
            .elements
            .get(selector)
            .and_then(|e| e.value.clone())
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Number of recorded calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.state()
            .call_history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) -> MutexGuard<'_, MockState> {
        let mut state = self.state();
        state.call_history.push(call);
        state
    }

    fn element(&self, handle: &ElementHandle, call: String) -> WayfinderResult<MockElement> {
        self.record(call)
            .elements
            .get(&handle.selector)
            .cloned()
            .ok_or_else(|| WayfinderError::StaleElement {
                selector: handle.selector.clone(),
            })
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, url: &str) -> WayfinderResult<()> {
        self.record(format!("navigate:{url}")).url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> WayfinderResult<String> {
        Ok(self.state().url.clone())
    }

    async fn title(&self) -> WayfinderResult<String> {
        Ok(self.state().title.clone())
    }

    async fn find_element(&self, selector: &str) -> WayfinderResult<ElementHandle> {
        let mut state = self.record(format!("find_element:{selector}"));
        let seen = {
            let count = state.queries.entry(selector.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let present = state
            .elements
            .get(selector)
            .is_some_and(|e| seen > e.appear_after);
        if !present {
            return Err(WayfinderError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        state.next_id += 1;
        Ok(ElementHandle::new(format!("mock-{}", state.next_id), selector))
    }

    async fn click(&self, element: &ElementHandle) -> WayfinderResult<()> {
        let _ = self.element(element, format!("click:{}", element.selector))?;
        let mut state = self.state();
        match state.click_failures {
            None => Err(WayfinderError::driver("element click intercepted")),
            Some(0) => Ok(()),
            Some(n) => {
                state.click_failures = Some(n - 1);
                Err(WayfinderError::driver("element click intercepted"))
            }
        }
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> WayfinderResult<()> {
        let _ = self.element(element, format!("send_keys:{}", element.selector))?;
        if let Some(target) = self.state().elements.get_mut(&element.selector) {
            target.value.get_or_insert_with(String::new).push_str(text);
        }
        Ok(())
    }

    async fn hover(&self, element: &ElementHandle) -> WayfinderResult<()> {
        let _ = self.element(element, format!("hover:{}", element.selector))?;
        Ok(())
    }

    async fn text(&self, element: &ElementHandle) -> WayfinderResult<String> {
        Ok(self.element(element, format!("text:{}", element.selector))?.text)
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> WayfinderResult<Option<String>> {
        let found = self.element(element, format!("attribute:{}:{name}", element.selector))?;
        if name == "value" {
            return Ok(found.value);
        }
        Ok(found.attributes.get(name).cloned())
    }

    async fn outer_html(&self, element: &ElementHandle) -> WayfinderResult<String> {
        Ok(self.element(element, format!("outer_html:{}", element.selector))?.html)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> WayfinderResult<bool> {
        Ok(self.element(element, format!("is_enabled:{}", element.selector))?.enabled)
    }

    async fn is_displayed(&self, element: &ElementHandle) -> WayfinderResult<bool> {
        Ok(self.element(element, format!("is_displayed:{}", element.selector))?.visible)
    }

    // scripts are opaque to the mock; only the arguments are recorded
    async fn execute_script(&self, _script: &str, args: Vec<Value>) -> WayfinderResult<Value> {
        let mut state = self.record(format!("execute_script:{}", Value::Array(args)));
        Ok(state.script_results.pop_front().unwrap_or(Value::Null))
    }

    async fn set_window_size(&self, width: u32, height: u32) -> WayfinderResult<()> {
        self.record(format!("set_window_size:{width}x{height}")).window = (width, height);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_new() {
            let handle = ElementHandle::new("el-1", "#go");
            assert_eq!(handle.id, "el-1");
            assert_eq!(handle.selector, "#go");
        }

        #[test]
        fn test_mock_element_builder() {
            let element = MockElement::new("<input>")
                .with_value("x")
                .with_attribute("name", "user")
                .hidden()
                .disabled();
            assert!(!element.visible);
            assert!(!element.enabled);
            assert_eq!(element.value.as_deref(), Some("x"));
            assert_eq!(element.attributes.get("name").map(String::as_str), Some("user"));
        }
    }

    mod mock_driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_starts_blank() {
            let driver = MockDriver::new();
            assert_eq!(driver.current_url().await.unwrap(), driver.blank_url());
            assert!(!driver.was_called("navigate"));
        }

        #[tokio::test]
        async fn test_navigate_records_history() {
            let driver = MockDriver::new();
            driver.navigate("https://example.com").await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://example.com");
            assert!(driver.was_called("navigate"));
            assert_eq!(driver.history(), vec!["navigate:https://example.com"]);
        }

        #[tokio::test]
        async fn test_find_missing_element() {
            let driver = MockDriver::new();
            let err = driver.find_element("#nope").await.unwrap_err();
            assert!(matches!(err, WayfinderError::ElementNotFound { .. }));
        }

        #[tokio::test]
        async fn test_element_appears_after_queries() {
            let driver =
                MockDriver::new().with_element("#late", MockElement::new("<p>").appearing_after(2));
            assert!(driver.find_element("#late").await.is_err());
            assert!(driver.find_element("#late").await.is_err());
            let handle = driver.find_element("#late").await.unwrap();
            assert_eq!(handle.selector, "#late");
        }

        #[tokio::test]
        async fn test_removed_element_is_stale() {
            let driver = MockDriver::new().with_element("#go", MockElement::new("<button>"));
            let handle = driver.find_element("#go").await.unwrap();
            driver.remove_element("#go");
            let err = driver.click(&handle).await.unwrap_err();
            assert!(matches!(err, WayfinderError::StaleElement { .. }));
        }

        #[tokio::test]
        async fn test_scripted_click_failures() {
            let driver = MockDriver::new().with_element("#go", MockElement::new("<button>"));
            driver.fail_clicks(1);
            let handle = driver.find_element("#go").await.unwrap();
            assert!(driver.click(&handle).await.unwrap_err().is_retryable());
            driver.click(&handle).await.unwrap();
            assert_eq!(driver.call_count("click:"), 2);
        }

        #[tokio::test]
        async fn test_send_keys_appends_value() {
            let driver = MockDriver::new().with_element("#user", MockElement::new("<input>"));
            let handle = driver.find_element("#user").await.unwrap();
            driver.send_keys(&handle, "ali").await.unwrap();
            driver.send_keys(&handle, "ce").await.unwrap();
            assert_eq!(
                driver.attribute(&handle, "value").await.unwrap().as_deref(),
                Some("alice")
            );
            assert_eq!(driver.value_of("#user").as_deref(), Some("alice"));
        }

        #[tokio::test]
        async fn test_script_results_queue() {
            let driver = MockDriver::new();
            driver.push_script_result(json!(7));
            assert_eq!(driver.execute_script("return 7", vec![]).await.unwrap(), json!(7));
            assert_eq!(
                driver.execute_script("return 7", vec![]).await.unwrap(),
                Value::Null
            );
        }

        #[tokio::test]
        async fn test_window_size() {
            let driver = MockDriver::new();
            driver.set_window_size(800, 600).await.unwrap();
            assert_eq!(driver.window_size(), (800, 600));
        }
    }
}
