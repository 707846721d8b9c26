//! Route table and the process-scoped route registry.

use crate::config_tree::normalize_key;
use crate::result::{WayfinderError, WayfinderResult};
use crate::route::Route;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Which route field a lookup value is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchField {
    /// Normalized route name
    #[default]
    Name,
    /// Concrete URL path, matched against every route's patterns
    Path,
}

/// A route matched by path, with the parameters its pattern bound
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Matched route
    pub route: Arc<Route>,
    /// Parameters bound by the first matching pattern
    pub params: BTreeMap<String, String>,
}

/// An ordered, immutable collection of uniquely named routes
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    /// Build a table, rejecting duplicate normalized names
    pub fn new(routes: Vec<Route>) -> WayfinderResult<Self> {
        let mut seen = HashSet::new();
        for route in &routes {
            if !seen.insert(route.name().to_string()) {
                return Err(WayfinderError::DuplicateRoute {
                    name: route.name().to_string(),
                });
            }
        }
        Ok(Self {
            routes: routes.into_iter().map(Arc::new).collect(),
        })
    }

    /// Routes in load order
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Number of routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Look up a route by name or by concrete path.
    ///
    /// A path matched by patterns of more than one route is an
    /// [`WayfinderError::AmbiguousRoute`].
    pub fn get_route(&self, value: &str, field: MatchField) -> WayfinderResult<Option<Arc<Route>>> {
        match field {
            MatchField::Name => Ok(self.by_name(value)),
            MatchField::Path => Ok(self.match_path(value)?.map(|m| m.route)),
        }
    }

    /// Look up a route by normalized name
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<Route>> {
        let name = normalize_key(name);
        self.routes.iter().find(|r| r.name() == name).cloned()
    }

    /// Match a concrete path against every route's patterns
    pub fn match_path(&self, path: &str) -> WayfinderResult<Option<RouteMatch>> {
        let mut matched: Vec<RouteMatch> = self
            .routes
            .iter()
            .filter_map(|route| {
                route.matching_pattern(path).map(|pattern| RouteMatch {
                    route: Arc::clone(route),
                    params: pattern.extract_params(path),
                })
            })
            .collect();

        if matched.len() > 1 {
            return Err(WayfinderError::AmbiguousRoute {
                path: path.to_string(),
                routes: matched.iter().map(|m| m.route.name().to_string()).collect(),
            });
        }
        Ok(matched.pop())
    }

    /// Pairs of routes with overlapping patterns, as
    /// `(route, pattern, other route, other pattern)`
    #[must_use]
    pub fn overlaps(&self) -> Vec<(String, String, String, String)> {
        let mut found = Vec::new();
        for (i, a) in self.routes.iter().enumerate() {
            for b in &self.routes[i + 1..] {
                for pa in a.paths() {
                    for pb in b.paths() {
                        if pa.overlaps(pb) {
                            found.push((
                                a.name().to_string(),
                                pa.pattern().to_string(),
                                b.name().to_string(),
                                pb.pattern().to_string(),
                            ));
                        }
                    }
                }
            }
        }
        found
    }
}

/// Source of route definitions
pub trait RouteLoader: Send + Sync {
    /// Discover and parse every route definition
    fn load(&self) -> WayfinderResult<Vec<Route>>;
}

/// A fixed, in-memory set of routes
#[derive(Debug, Clone, Default)]
pub struct StaticRoutes {
    routes: Vec<Route>,
}

impl StaticRoutes {
    /// Create from routes
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }
}

impl RouteLoader for StaticRoutes {
    fn load(&self) -> WayfinderResult<Vec<Route>> {
        Ok(self.routes.clone())
    }
}

/// Lazily loaded, cached route table.
///
/// The first [`RouteRegistry::load`] runs the loader; later calls return the
/// cached table until [`RouteRegistry::reset`].
pub struct RouteRegistry {
    loader: Box<dyn RouteLoader>,
    cache: RwLock<Option<Arc<RouteTable>>>,
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl RouteRegistry {
    /// Create a registry over a loader
    #[must_use]
    pub fn new(loader: impl RouteLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            cache: RwLock::new(None),
        }
    }

    /// Create a registry over in-memory routes
    #[must_use]
    pub fn from_routes(routes: Vec<Route>) -> Self {
        Self::new(StaticRoutes::new(routes))
    }

    /// Load the table, running the loader only on first use
    pub fn load(&self) -> WayfinderResult<Arc<RouteTable>> {
        if let Some(table) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(RouteTable::new(self.loader.load()?)?);
        info!(routes = table.len(), "route table loaded");

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // a concurrent load may have stored first; keep that one
        Ok(Arc::clone(cache.get_or_insert(table)))
    }

    /// Drop the cached table so the next load rescans
    pub fn reset(&self) {
        debug!("route table reset");
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a table is cached
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Look up a route by name or by path
    pub fn get_route(&self, value: &str, field: MatchField) -> WayfinderResult<Option<Arc<Route>>> {
        self.load()?.get_route(value, field)
    }
}
