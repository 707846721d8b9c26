//! Wayfinder: route-aware page objects for browser-driven tests
//!
//! Pages are declared as named routes with URL patterns and a tree of
//! element selectors. A [`Session`] works out which route the browser is
//! on, resolves compound ids such as `"form:submit"` against that route's
//! page object, and drives the browser through a [`BrowserDriver`] with
//! polling waits and bounded retries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   WAYFINDER Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ routes.yml │    │ Route      │    │ Page       │            │
//! │   │ (YAML/JSON)│───►│ Table      │───►│ Object     │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             │ compound id       │
//! │   ┌────────────┐    ┌────────────┐    ┌─────▼──────┐            │
//! │   │ Browser    │◄───│ Retry /    │◄───│ Selector   │            │
//! │   │ Driver     │    │ Wait       │    │ Resolver   │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wayfinder::prelude::*;
//!
//! # async fn demo() -> WayfinderResult<()> {
//! let form = ConfigTree::new().with_leaf("submit", "button[type=submit]");
//! let login = ConfigTree::new().with(
//!     "form",
//!     ConfigNode::LeafWithChildren("#login".into(), form),
//! );
//! let registry = Arc::new(RouteRegistry::from_routes(vec![
//!     Route::new("login", &["/login"], login),
//! ]));
//! let session = Session::new(MockDriver::new(), registry);
//! session.visit("login", &[] as &[&str]).await?;
//! session.click("form:submit", 2, None).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[allow(clippy::missing_errors_doc)]
pub mod config;
pub mod config_tree;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod driver;
#[allow(clippy::missing_errors_doc)]
pub mod page_object;
mod result;
#[allow(clippy::missing_errors_doc)]
pub mod retry;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod route;
#[allow(clippy::missing_errors_doc)]
pub mod routes;
pub mod selector;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::doc_markdown,
    clippy::future_not_send
)]
pub mod session;
#[allow(clippy::missing_errors_doc)]
pub mod source;
#[allow(clippy::missing_errors_doc)]
pub mod wait;

/// Chromium-backed driver (requires `browser` feature)
#[cfg(feature = "browser")]
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod chromium;

pub use config::{EmptyParamsPath, HarnessConfig, RoutesConfig};
pub use config_tree::{normalize_key, ConfigNode, ConfigTree};
pub use driver::{BrowserDriver, ElementHandle, MockDriver, MockElement};
pub use page_object::{url_path, PageObject, PageObjectResolver};
pub use result::{WayfinderError, WayfinderResult};
pub use retry::{CheckOutcome, FixedAttempts, RetryPolicy};
pub use route::{PageHelper, PathPattern, Route};
pub use routes::{MatchField, RouteLoader, RouteMatch, RouteRegistry, RouteTable, StaticRoutes};
pub use selector::{resolve, Resolution, ResolvedNode};
pub use session::Session;
pub use source::{GlobRouteLoader, SourceFormat};
pub use wait::{poll, poll_until, Condition, WaitOptions, WaitResult};

#[cfg(feature = "browser")]
pub use chromium::{ChromiumDriver, ChromiumOptions};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::config::*;
    pub use super::config_tree::*;
    pub use super::driver::*;
    pub use super::page_object::*;
    pub use super::result::*;
    pub use super::retry::*;
    pub use super::route::*;
    pub use super::routes::*;
    pub use super::selector::*;
    pub use super::session::*;
    pub use super::source::*;
    pub use super::wait::*;

    #[cfg(feature = "browser")]
    pub use super::chromium::*;
}
