//! Chromium driver over the Chrome DevTools Protocol.
//!
//! Element handles are re-queried by selector on every call, so a handle
//! whose element left the document reports [`WayfinderError::StaleElement`].

use crate::driver::{BrowserDriver, ElementHandle, ABOUT_BLANK};
use crate::result::{WayfinderError, WayfinderResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Chromium launch options
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Run in headless mode
    pub headless: bool,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            width: 1280,
            height: 720,
        }
    }
}

impl ChromiumOptions {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set the initial window size
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// [`BrowserDriver`] backed by a chromium page
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
    next_id: AtomicU64,
}

fn cdp_error(err: impl std::fmt::Display) -> WayfinderError {
    WayfinderError::driver(err.to_string())
}

// element probes evaluate to null when the selector no longer matches
fn element_probe(selector: &str, body: &str) -> WayfinderResult<String> {
    let selector = serde_json::to_string(selector)?;
    Ok(format!(
        "(() => {{ const el = document.querySelector({selector}); if (!el) return null; {body} }})()"
    ))
}

impl ChromiumDriver {
    /// Launch chromium and open a blank page
    pub async fn launch(options: ChromiumOptions) -> WayfinderResult<Self> {
        let mut builder = BrowserConfig::builder().window_size(options.width, options.height);
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(cdp_error)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_error)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!(error = %err, "CDP handler stopped");
                    break;
                }
            }
        });
        let page = browser.new_page(ABOUT_BLANK).await.map_err(cdp_error)?;
        debug!(headless = options.headless, "chromium launched");

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            next_id: AtomicU64::new(0),
        })
    }

    /// Close the browser
    pub async fn close(self) -> WayfinderResult<()> {
        let _ = self.browser.lock().await.close().await.map_err(cdp_error)?;
        self.handler.abort();
        Ok(())
    }

    async fn element(&self, handle: &ElementHandle) -> WayfinderResult<Element> {
        self.page
            .find_element(handle.selector.as_str())
            .await
            .map_err(|_| WayfinderError::StaleElement {
                selector: handle.selector.clone(),
            })
    }

    async fn probe(&self, handle: &ElementHandle, body: &str) -> WayfinderResult<Value> {
        let script = element_probe(&handle.selector, body)?;
        let result = self.page.evaluate(script).await.map_err(cdp_error)?;
        match result.value() {
            None | Some(Value::Null) => Err(WayfinderError::StaleElement {
                selector: handle.selector.clone(),
            }),
            Some(value) => Ok(value.clone()),
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> WayfinderResult<()> {
        let _ = self.page.goto(url).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn current_url(&self) -> WayfinderResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(cdp_error)?
            .unwrap_or_else(|| ABOUT_BLANK.to_string()))
    }

    async fn title(&self) -> WayfinderResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(cdp_error)?
            .unwrap_or_default())
    }

    async fn find_element(&self, selector: &str) -> WayfinderResult<ElementHandle> {
        match self.page.find_element(selector).await {
            Ok(_) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                Ok(ElementHandle::new(format!("cdp-{id}"), selector))
            }
            Err(_) => Err(WayfinderError::ElementNotFound {
                selector: selector.to_string(),
            }),
        }
    }

    async fn click(&self, element: &ElementHandle) -> WayfinderResult<()> {
        let _ = self.element(element).await?.click().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> WayfinderResult<()> {
        let target = self.element(element).await?;
        let _ = target.click().await.map_err(cdp_error)?;
        let _ = target.type_str(text).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn hover(&self, element: &ElementHandle) -> WayfinderResult<()> {
        let _ = self.element(element).await?.hover().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn text(&self, element: &ElementHandle) -> WayfinderResult<String> {
        let value = self.probe(element, "return el.innerText;").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> WayfinderResult<Option<String>> {
        if name == "value" {
            let value = self
                .probe(element, "return { v: el.value === undefined ? null : String(el.value) };")
                .await?;
            return Ok(value.get("v").and_then(Value::as_str).map(str::to_string));
        }
        self.element(element)
            .await?
            .attribute(name)
            .await
            .map_err(cdp_error)
    }

    async fn outer_html(&self, element: &ElementHandle) -> WayfinderResult<String> {
        let value = self.probe(element, "return el.outerHTML;").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn is_enabled(&self, element: &ElementHandle) -> WayfinderResult<bool> {
        let value = self.probe(element, "return !el.disabled;").await?;
        Ok(value.as_bool().unwrap_or(true))
    }

    async fn is_displayed(&self, element: &ElementHandle) -> WayfinderResult<bool> {
        let value = self
            .probe(
                element,
                "const s = window.getComputedStyle(el); \
                 return s.display !== 'none' && s.visibility !== 'hidden' \
                 && el.getClientRects().length > 0;",
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> WayfinderResult<Value> {
        let args = serde_json::to_string(&args)?;
        let wrapped = format!("(function() {{ {script} }}).apply(null, {args})");
        let result = self.page.evaluate(wrapped).await.map_err(cdp_error)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn set_window_size(&self, width: u32, height: u32) -> WayfinderResult<()> {
        let params =
            SetDeviceMetricsOverrideParams::new(i64::from(width), i64::from(height), 1.0, false);
        let _ = self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }

    fn blank_url(&self) -> &str {
        ABOUT_BLANK
    }
}
