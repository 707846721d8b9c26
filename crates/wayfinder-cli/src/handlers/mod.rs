//! Command handlers
//!
//! Each handler builds a serializable report from the loaded routes and
//! hands it to the [`Reporter`](crate::output::Reporter).

pub mod check;
pub mod href;
pub mod resolve;
pub mod routes;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use tracing::debug;
use wayfinder::{HarnessConfig, RouteLoader, RouteTable};

pub use check::{check_routes, execute_check, CheckReport};
pub use href::{build_href, execute_href, HrefReport};
pub use resolve::{execute_resolve, execute_selector, resolve_url, ResolveReport, SelectorReport};
pub use routes::{execute_routes, list_routes, RoutesReport};

/// Harness configuration from the `--config` file, environment and `--routes`
pub fn load_harness(config: &CliConfig) -> CliResult<HarnessConfig> {
    let harness = match &config.config_path {
        Some(path) => HarnessConfig::from_path(path)?,
        None => HarnessConfig::new(),
    };
    let harness = harness
        .apply_env()
        .map_err(|e| CliError::config(e.to_string()))?;
    Ok(match &config.routes_root {
        Some(root) => harness.with_routes_root(root),
        None => harness,
    })
}

/// Discover, parse and index every route file
pub fn load_table(harness: &HarnessConfig) -> CliResult<RouteTable> {
    let routes = harness.route_loader().load()?;
    debug!(routes = routes.len(), root = %harness.routes.root.display(), "routes loaded");
    Ok(RouteTable::new(routes)?)
}
