//! Page objects resolved from browser URLs.
//!
//! A [`PageObject`] is the route-specific configuration tree merged over a
//! shared base tree, together with the route it came from, the concrete
//! path, the bound path parameters and the page helpers.
//!
//! ```ignore
//! let resolver = PageObjectResolver::new(base_tree);
//! let page = resolver.resolve_url(&table, "https://shop.test/users/42?tab=1")?;
//! assert_eq!(page.route().name(), "userProfile");
//! assert_eq!(page.param("id"), Some("42"));
//! let css = page.selector("header:nav:loginLink")?;
//! ```

use crate::config_tree::{normalize_key, ConfigTree};
use crate::result::{WayfinderError, WayfinderResult};
use crate::route::{PageHelper, Route};
use crate::routes::{RouteMatch, RouteTable};
use crate::selector::{self, Resolution};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

/// Selector used when a compound id carries no fragment
pub const BODY_SELECTOR: &str = "body";

/// Path part of a browser URL, without query string or fragment.
///
/// Absolute URLs are reduced to their path; anything else is treated as a
/// path already.
#[must_use]
pub fn url_path(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        return parsed.path().to_string();
    }
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}

/// A resolved page: merged configuration, route, path and helpers
#[derive(Clone)]
pub struct PageObject {
    config: ConfigTree,
    route: Arc<Route>,
    path: String,
    params: BTreeMap<String, String>,
    helpers: BTreeMap<String, PageHelper>,
}

impl std::fmt::Debug for PageObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageObject")
            .field("route", &self.route.name())
            .field("path", &self.path)
            .field("params", &self.params)
            .field("config", &self.config)
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PageObject {
    /// Merged configuration tree
    #[must_use]
    pub const fn config(&self) -> &ConfigTree {
        &self.config
    }

    /// Route the page was resolved to
    #[must_use]
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    /// Concrete path the page was resolved from
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parameters bound by the matching pattern
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// One bound parameter
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Resolve a compound id against the merged configuration
    pub fn resolve(&self, compound_id: &str) -> WayfinderResult<Resolution<'_>> {
        selector::resolve(&self.config, compound_id, self.route.name())
    }

    /// CSS selector for a compound id, [`BODY_SELECTOR`] when empty
    pub fn selector(&self, compound_id: &str) -> WayfinderResult<String> {
        let resolution = self.resolve(compound_id)?;
        Ok(resolution.css().unwrap_or(BODY_SELECTOR).to_string())
    }

    /// Whether a helper is registered under the normalized name
    #[must_use]
    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains_key(&normalize_key(name))
    }

    /// Invoke a helper with this page object
    pub fn call(&self, name: &str, args: &[Value]) -> WayfinderResult<Value> {
        let helper = self
            .helpers
            .get(&normalize_key(name))
            .ok_or_else(|| WayfinderError::UnknownHelper {
                name: name.to_string(),
                page: self.route.name().to_string(),
            })?;
        helper(self, args)
    }
}

/// Builds page objects from route matches over a shared base
#[derive(Clone, Default)]
pub struct PageObjectResolver {
    base: ConfigTree,
    base_helpers: BTreeMap<String, PageHelper>,
}

impl std::fmt::Debug for PageObjectResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageObjectResolver")
            .field("base", &self.base)
            .field("base_helpers", &self.base_helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PageObjectResolver {
    /// Create a resolver over a base configuration tree
    #[must_use]
    pub fn new(base: ConfigTree) -> Self {
        Self {
            base,
            base_helpers: BTreeMap::new(),
        }
    }

    /// Register a helper available on every page unless a route overrides it
    #[must_use]
    pub fn with_helper<F>(mut self, name: &str, helper: F) -> Self
    where
        F: Fn(&PageObject, &[Value]) -> WayfinderResult<Value> + Send + Sync + 'static,
    {
        let _ = self.base_helpers.insert(normalize_key(name), Arc::new(helper));
        self
    }

    /// Shared base tree
    #[must_use]
    pub const fn base(&self) -> &ConfigTree {
        &self.base
    }

    /// Merge a matched route over the base
    #[must_use]
    pub fn build(&self, matched: RouteMatch, path: &str) -> PageObject {
        let config = matched.route.page_object().with_defaults(&self.base);
        let mut helpers = self.base_helpers.clone();
        helpers.extend(
            matched
                .route
                .helpers()
                .iter()
                .map(|(name, helper)| (name.clone(), Arc::clone(helper))),
        );
        PageObject {
            config,
            route: matched.route,
            path: path.to_string(),
            params: matched.params,
            helpers,
        }
    }

    /// Resolve the page object for a browser URL
    pub fn resolve_url(&self, table: &RouteTable, url: &str) -> WayfinderResult<PageObject> {
        let path = url_path(url);
        let matched = table
            .match_path(&path)?
            .ok_or_else(|| WayfinderError::RouteNotDefinedForUrl { url: path.clone() })?;
        Ok(self.build(matched, &path))
    }
}
