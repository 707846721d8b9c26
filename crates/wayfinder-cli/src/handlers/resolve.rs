//! Resolve and selector command handlers

use crate::error::CliResult;
use crate::output::{dim, name, Render, Reporter};
use serde::Serialize;
use std::collections::BTreeMap;
use wayfinder::{PageObject, PageObjectResolver, RouteTable};

/// Route matched by a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// URL path that was matched
    pub path: String,
    /// Matching route
    pub route: String,
    /// Pattern of the route that matched
    pub pattern: Option<String>,
    /// Bound path parameters
    pub params: BTreeMap<String, String>,
}

impl ResolveReport {
    fn from_page(page: &PageObject) -> Self {
        Self {
            path: page.path().to_string(),
            route: page.route().name().to_string(),
            pattern: page
                .route()
                .matching_pattern(page.path())
                .map(|p| p.pattern().to_string()),
            params: page.params().clone(),
        }
    }
}

impl Render for ResolveReport {
    fn render_text(&self, styled: bool) -> Vec<String> {
        let mut lines = vec![format!(
            "{} {}",
            name(&self.route, styled),
            dim(self.pattern.as_deref().unwrap_or_default(), styled)
        )];
        lines.extend(self.params.iter().map(|(k, v)| format!("  {k} = {v}")));
        lines
    }
}

/// CSS selector for a compound id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorReport {
    /// Route the URL matched
    pub route: String,
    /// Compound id
    pub id: String,
    /// Accumulated CSS selector
    pub selector: String,
}

impl Render for SelectorReport {
    fn render_text(&self, _styled: bool) -> Vec<String> {
        vec![self.selector.clone()]
    }
}

/// Match `url` against the route table
pub fn resolve_url(table: &RouteTable, url: &str) -> CliResult<ResolveReport> {
    let page = PageObjectResolver::default().resolve_url(table, url)?;
    Ok(ResolveReport::from_page(&page))
}

/// Selector for `id` on the page at `url`
pub fn resolve_selector(table: &RouteTable, url: &str, id: &str) -> CliResult<SelectorReport> {
    let page = PageObjectResolver::default().resolve_url(table, url)?;
    Ok(SelectorReport {
        route: page.route().name().to_string(),
        id: id.to_string(),
        selector: page.selector(id)?,
    })
}

/// Execute the resolve command
pub fn execute_resolve(reporter: &Reporter, table: &RouteTable, url: &str) -> CliResult<()> {
    reporter.emit(&resolve_url(table, url)?)
}

/// Execute the selector command
pub fn execute_selector(
    reporter: &Reporter,
    table: &RouteTable,
    url: &str,
    id: &str,
) -> CliResult<()> {
    reporter.emit(&resolve_selector(table, url, id)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crate::handlers::fixtures;
    use wayfinder::{source, SourceFormat, WayfinderError};

    fn table() -> RouteTable {
        let routes =
            source::parse_routes(fixtures::SHOP_ROUTES, SourceFormat::Yaml).unwrap();
        RouteTable::new(routes).unwrap()
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_binds_params_and_strips_query() {
            let report = resolve_url(&table(), "https://shop.test/orders/7/items?x=1").unwrap();
            assert_eq!(report.route, "order");
            assert_eq!(report.path, "/orders/7/items");
            assert_eq!(report.pattern.as_deref(), Some("/orders/:orderId/:tab"));
            assert_eq!(report.params.get("orderId").map(String::as_str), Some("7"));
            assert_eq!(report.params.get("tab").map(String::as_str), Some("items"));
        }

        #[test]
        fn test_text_lists_params() {
            let lines = resolve_url(&table(), "/orders/7").unwrap().render_text(false);
            assert_eq!(lines, vec!["order /orders/:orderId", "  orderId = 7"]);
        }

        #[test]
        fn test_unknown_url() {
            let err = resolve_url(&table(), "/cart").unwrap_err();
            assert!(matches!(
                err,
                CliError::Wayfinder(WayfinderError::RouteNotDefinedForUrl { .. })
            ));
        }
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_compound_id() {
            let report = resolve_selector(&table(), "/login", "login form:submit button").unwrap();
            assert_eq!(report.route, "login");
            assert_eq!(report.selector, "form#login button[type=submit]");
        }

        #[test]
        fn test_missing_segment_names_it() {
            let err = resolve_selector(&table(), "/login", "missingSection:button").unwrap_err();
            assert!(err.to_string().contains("\"missingSection\""));
        }
    }
}
