//! Routes command handler

use crate::error::CliResult;
use crate::output::{dim, name, Render, Reporter};
use serde::Serialize;
use wayfinder::RouteTable;

/// One route and its patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    /// Route name
    pub name: String,
    /// Path patterns in declaration order
    pub paths: Vec<String>,
}

/// Every loaded route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutesReport {
    /// Routes in load order
    pub routes: Vec<RouteEntry>,
}

impl Render for RoutesReport {
    fn render_text(&self, styled: bool) -> Vec<String> {
        let width = self.routes.iter().map(|r| r.name.len()).max().unwrap_or(0);
        self.routes
            .iter()
            .map(|route| {
                let paths = if route.paths.is_empty() {
                    "(no paths)".to_string()
                } else {
                    route.paths.join(", ")
                };
                let padding = " ".repeat(width - route.name.len());
                format!("{}{padding}  {}", name(&route.name, styled), dim(&paths, styled))
            })
            .collect()
    }
}

/// Summarize a route table
#[must_use]
pub fn list_routes(table: &RouteTable) -> RoutesReport {
    RoutesReport {
        routes: table
            .routes()
            .iter()
            .map(|route| RouteEntry {
                name: route.name().to_string(),
                paths: route.paths().iter().map(|p| p.pattern().to_string()).collect(),
            })
            .collect(),
    }
}

/// Execute the routes command
pub fn execute_routes(reporter: &Reporter, table: &RouteTable) -> CliResult<()> {
    let report = list_routes(table);
    if report.routes.is_empty() {
        reporter.warning("no routes found");
    }
    reporter.emit(&report)
}
