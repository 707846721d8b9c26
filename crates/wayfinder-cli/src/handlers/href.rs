//! Href command handler

use crate::error::CliResult;
use crate::output::{Render, Reporter};
use serde::Serialize;
use wayfinder::{HarnessConfig, RouteTable, WayfinderError};

/// URL a visit would navigate to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HrefReport {
    /// Page name
    pub page: String,
    /// Parameters supplied
    pub params: Vec<String>,
    /// Resulting URL
    pub url: String,
}

impl Render for HrefReport {
    fn render_text(&self, _styled: bool) -> Vec<String> {
        vec![self.url.clone()]
    }
}

/// Build the visit URL for `page` with positional `params`
pub fn build_href(
    harness: &HarnessConfig,
    table: &RouteTable,
    page: &str,
    params: &[String],
) -> CliResult<HrefReport> {
    let route = table
        .by_name(page)
        .ok_or_else(|| WayfinderError::RouteNotFound {
            page: page.to_string(),
        })?;
    let path = route
        .href(params, harness.empty_params_path)
        .ok_or_else(|| WayfinderError::NoMatchingPath {
            page: page.to_string(),
            params: params.len(),
        })?;
    Ok(HrefReport {
        page: route.name().to_string(),
        params: params.to_vec(),
        url: harness.url_for(&path),
    })
}

/// Execute the href command
pub fn execute_href(
    reporter: &Reporter,
    harness: &HarnessConfig,
    table: &RouteTable,
    page: &str,
    params: &[String],
) -> CliResult<()> {
    reporter.emit(&build_href(harness, table, page, params)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use wayfinder::{ConfigTree, EmptyParamsPath, Route};

    fn table() -> RouteTable {
        RouteTable::new(vec![
            Route::new("home", &["/", "/home"], ConfigTree::new()),
            Route::new("order", &["/orders/:orderId"], ConfigTree::new()),
        ])
        .unwrap()
    }

    fn params(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_fills_params_onto_base_url() {
        let harness = HarnessConfig::new().with_base_url("https://shop.test");
        let report = build_href(&harness, &table(), "order", &params(&["42"])).unwrap();
        assert_eq!(report.url, "https://shop.test/orders/42");
    }

    #[test]
    fn test_no_params_uses_configured_path() {
        let harness = HarnessConfig::new();
        let last = build_href(&harness, &table(), "home", &[]).unwrap();
        assert_eq!(last.url, "/home");

        let harness = harness.with_empty_params_path(EmptyParamsPath::First);
        let first = build_href(&harness, &table(), "home", &[]).unwrap();
        assert_eq!(first.url, "/");
    }

    #[test]
    fn test_unknown_page() {
        let err = build_href(&HarnessConfig::new(), &table(), "cart", &[]).unwrap_err();
        assert!(matches!(
            err,
            CliError::Wayfinder(WayfinderError::RouteNotFound { .. })
        ));
    }

    #[test]
    fn test_param_count_mismatch() {
        let err =
            build_href(&HarnessConfig::new(), &table(), "order", &params(&["1", "2"])).unwrap_err();
        assert!(matches!(
            err,
            CliError::Wayfinder(WayfinderError::NoMatchingPath { params: 2, .. })
        ));
    }
}
