//! Route definition files.
//!
//! A route file is a YAML or JSON mapping from route name to definition:
//!
//! ```yaml
//! login:
//!   path: /login
//!   pageObject:
//!     usernameField: "#user"
//!     submitButton: "#go"
//! userProfile:
//!   path: [/users/:id, /people/:id]
//!   pageObject:
//!     name: h1.name
//! ```

use crate::config_tree::ConfigTree;
use crate::result::{WayfinderError, WayfinderResult};
use crate::route::Route;
use crate::routes::RouteLoader;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default discovery pattern, relative to the discovery root
pub const DEFAULT_ROUTES_PATTERN: &str = "**/features/routes.*";

/// Directory names never searched for route files
pub const SKIPPED_DIRS: [&str; 3] = ["node_modules", "target", ".git"];

/// Route file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// YAML (`.yaml`, `.yml`)
    Yaml,
    /// JSON (`.json`)
    Json,
}

impl SourceFormat {
    /// Detect the format from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteDefinition {
    #[serde(default)]
    path: Option<OneOrMany>,
    #[serde(default, rename = "pageObject", alias = "page_object")]
    page_object: ConfigTree,
}

impl RouteDefinition {
    fn into_route(self, name: &str) -> Route {
        let paths = match self.path {
            None => Vec::new(),
            Some(OneOrMany::One(path)) => vec![path],
            Some(OneOrMany::Many(paths)) => paths,
        };
        Route::new(name, &paths, self.page_object)
    }
}

/// Parse route definitions from text
pub fn parse_routes(text: &str, format: SourceFormat) -> WayfinderResult<Vec<Route>> {
    let definitions: BTreeMap<String, RouteDefinition> = match format {
        SourceFormat::Yaml => serde_yaml_ng::from_str(text)?,
        SourceFormat::Json => serde_json::from_str(text)?,
    };
    Ok(definitions
        .into_iter()
        .map(|(name, definition)| definition.into_route(&name))
        .collect())
}

/// Read and parse one route file
pub fn load_file(path: &Path) -> WayfinderResult<Vec<Route>> {
    let source_error = |message: String| WayfinderError::RouteSource {
        path: path.display().to_string(),
        message,
    };
    let format = SourceFormat::from_path(path)
        .ok_or_else(|| source_error("unsupported extension, expected .yaml, .yml or .json".into()))?;
    let text = std::fs::read_to_string(path).map_err(|e| source_error(e.to_string()))?;
    parse_routes(&text, format).map_err(|e| source_error(e.to_string()))
}

/// Discovers route files under a root directory with a glob pattern
#[derive(Debug, Clone)]
pub struct GlobRouteLoader {
    root: PathBuf,
    pattern: String,
}

impl GlobRouteLoader {
    /// Create a loader using [`DEFAULT_ROUTES_PATTERN`]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pattern: DEFAULT_ROUTES_PATTERN.to_string(),
        }
    }

    /// Set the discovery pattern, relative to the root
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Route files matching the pattern, sorted, skipping [`SKIPPED_DIRS`]
    /// and files with unsupported extensions
    pub fn discover(&self) -> WayfinderResult<Vec<PathBuf>> {
        let full = self.root.join(&self.pattern);
        let full = full.to_string_lossy();
        let entries = glob::glob(&full).map_err(|e| WayfinderError::RouteSource {
            path: full.to_string(),
            message: e.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| WayfinderError::RouteSource {
                path: e.path().display().to_string(),
                message: e.to_string(),
            })?;
            let skipped = path.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name))
            });
            if !skipped && SourceFormat::from_path(&path).is_some() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl RouteLoader for GlobRouteLoader {
    fn load(&self) -> WayfinderResult<Vec<Route>> {
        let mut routes = Vec::new();
        for file in self.discover()? {
            let loaded = load_file(&file)?;
            debug!(file = %file.display(), routes = loaded.len(), "route file parsed");
            routes.extend(loaded);
        }
        Ok(routes)
    }
}
