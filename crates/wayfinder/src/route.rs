//! Routes and URL path patterns.
//!
//! A route names a logical page, lists one or more URL path patterns that
//! lead to it, and carries the page-object configuration tree used to find
//! elements on it.

use crate::config::EmptyParamsPath;
use crate::config_tree::{normalize_key, ConfigTree};
use crate::page_object::PageObject;
use crate::result::WayfinderResult;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A page helper.
///
/// Helpers receive the resolved page object explicitly, so they can read the
/// merged configuration and route of the page they are called on.
pub type PageHelper = Arc<dyn Fn(&PageObject, &[Value]) -> WayfinderResult<Value> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Parameter(String),
}

/// URL path pattern with `:param` placeholders
///
/// Patterns support:
/// - Literal segments: `/login`
/// - Named parameters: `/users/:id`
///
/// Empty segments are ignored, so `/users/:id`, `users/:id` and `/users/:id/`
/// are the same pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pattern: String,
    segments: Vec<PathSegment>,
}

impl PathPattern {
    /// Parse a pattern
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) => PathSegment::Parameter(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// Check if a concrete path matches the pattern
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // parameters consume exactly one segment each
        if path_segments.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&path_segments)
            .all(|(segment, actual)| match segment {
                PathSegment::Literal(lit) => lit == actual,
                PathSegment::Parameter(_) => true,
            })
    }

    /// Extract parameters from a concrete path
    #[must_use]
    pub fn extract_params(&self, path: &str) -> BTreeMap<String, String> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        self.segments
            .iter()
            .zip(path_segments)
            .filter_map(|(segment, actual)| match segment {
                PathSegment::Parameter(name) => Some((name.clone(), actual.to_string())),
                PathSegment::Literal(_) => None,
            })
            .collect()
    }

    /// Number of `:param` segments
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, PathSegment::Parameter(_)))
            .count()
    }

    /// Names of the `:param` segments in order
    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                PathSegment::Parameter(name) => Some(name.as_str()),
                PathSegment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute `params` positionally into the pattern.
    ///
    /// Returns `None` unless the pattern has exactly `params.len()`
    /// parameter segments. Separators are kept as written.
    #[must_use]
    pub fn fill<S: AsRef<str>>(&self, params: &[S]) -> Option<String> {
        if self.param_count() != params.len() {
            return None;
        }
        let mut values = params.iter();
        let filled: Vec<&str> = self
            .pattern
            .split('/')
            .map(|part| {
                if part.starts_with(':') {
                    values.next().map_or(part, |v| v.as_ref())
                } else {
                    part
                }
            })
            .collect();
        Some(filled.join("/"))
    }

    /// Whether some concrete path matches both patterns
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (PathSegment::Literal(a), PathSegment::Literal(b)) => a == b,
                    _ => true,
                })
    }

    /// Pattern as written
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// A named page definition
#[derive(Clone)]
pub struct Route {
    name: String,
    paths: Vec<PathPattern>,
    page_object: ConfigTree,
    helpers: BTreeMap<String, PageHelper>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("paths", &self.paths)
            .field("page_object", &self.page_object)
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Route {
    /// Create a route; the name is normalized
    #[must_use]
    pub fn new<S: AsRef<str>>(name: &str, paths: &[S], page_object: ConfigTree) -> Self {
        Self {
            name: normalize_key(name),
            paths: paths.iter().map(|p| PathPattern::new(p.as_ref())).collect(),
            page_object,
            helpers: BTreeMap::new(),
        }
    }

    /// Attach a helper under the normalized form of `name`
    #[must_use]
    pub fn with_helper<F>(mut self, name: &str, helper: F) -> Self
    where
        F: Fn(&PageObject, &[Value]) -> WayfinderResult<Value> + Send + Sync + 'static,
    {
        let _ = self.helpers.insert(normalize_key(name), Arc::new(helper));
        self
    }

    /// Normalized route name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared path patterns, in declaration order
    #[must_use]
    pub fn paths(&self) -> &[PathPattern] {
        &self.paths
    }

    /// Route-specific page-object configuration
    #[must_use]
    pub const fn page_object(&self) -> &ConfigTree {
        &self.page_object
    }

    /// Route-specific helpers
    #[must_use]
    pub const fn helpers(&self) -> &BTreeMap<String, PageHelper> {
        &self.helpers
    }

    /// First declared pattern matching `path`
    #[must_use]
    pub fn matching_pattern(&self, path: &str) -> Option<&PathPattern> {
        self.paths.iter().find(|p| p.matches(path))
    }

    /// Path to visit this route with positional `params`.
    ///
    /// Parameters fill the first pattern with exactly `params.len()`
    /// placeholders. Without parameters the first or last declared pattern
    /// is used as written.
    #[must_use]
    pub fn href<S: AsRef<str>>(&self, params: &[S], empty: EmptyParamsPath) -> Option<String> {
        if params.is_empty() {
            let pattern = match empty {
                EmptyParamsPath::First => self.paths.first(),
                EmptyParamsPath::Last => self.paths.last(),
            }?;
            return Some(pattern.pattern().to_string());
        }
        self.paths.iter().find_map(|p| p.fill(params))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod path_pattern_tests {
        use super::*;

        #[test]
        fn test_literal_match() {
            let pattern = PathPattern::new("/login");
            assert!(pattern.matches("/login"));
            assert!(pattern.matches("login/"));
            assert!(!pattern.matches("/register"));
            assert!(!pattern.matches("/login/extra"));
        }

        #[test]
        fn test_parameter_match() {
            let pattern = PathPattern::new("users/:id");
            assert!(pattern.matches("users/42"));
            assert!(pattern.matches("/users/abc"));
            assert!(!pattern.matches("/users"));
            assert!(!PathPattern::new("users/:id/edit").matches("users/42"));
        }

        #[test]
        fn test_extract_params() {
            let pattern = PathPattern::new("/users/:id/posts/:post_id");
            let params = pattern.extract_params("/users/42/posts/100");

            assert_eq!(params.get("id"), Some(&"42".to_string()));
            assert_eq!(params.get("post_id"), Some(&"100".to_string()));
            assert_eq!(pattern.param_names(), vec!["id", "post_id"]);
        }

        #[test]
        fn test_root_pattern() {
            let pattern = PathPattern::new("/");
            assert!(pattern.matches("/"));
            assert!(pattern.matches(""));
            assert!(!pattern.matches("/home"));
        }

        #[test]
        fn test_fill() {
            let pattern = PathPattern::new("/users/:id/posts/:post");
            assert_eq!(
                pattern.fill(&["42", "7"]),
                Some("/users/42/posts/7".to_string())
            );
            assert_eq!(pattern.fill(&["42"]), None);
            assert_eq!(
                PathPattern::new("/login").fill::<&str>(&[]),
                Some("/login".to_string())
            );
        }

        #[test]
        fn test_overlaps() {
            let a = PathPattern::new("/users/:id");
            assert!(a.overlaps(&PathPattern::new("/users/me")));
            assert!(a.overlaps(&PathPattern::new("/:section/:id")));
            assert!(!a.overlaps(&PathPattern::new("/teams/:id")));
            assert!(!a.overlaps(&PathPattern::new("/users/:id/edit")));
        }

        proptest! {
            #[test]
            fn prop_param_binds_any_segment(value in "[A-Za-z0-9_-]{1,12}") {
                let pattern = PathPattern::new("users/:id");
                let path = format!("users/{value}");
                prop_assert!(pattern.matches(&path));
                let bound = pattern.extract_params(&path);
                prop_assert_eq!(bound.get("id"), Some(&value));
            }

            #[test]
            fn prop_filled_pattern_matches_itself(
                a in "[a-z0-9]{1,8}",
                b in "[a-z0-9]{1,8}",
            ) {
                let pattern = PathPattern::new("/orgs/:org/repos/:repo");
                let filled = pattern.fill(&[a.as_str(), b.as_str()]).unwrap();
                prop_assert!(pattern.matches(&filled));
                let params = pattern.extract_params(&filled);
                prop_assert_eq!(params.get("org"), Some(&a));
                prop_assert_eq!(params.get("repo"), Some(&b));
            }
        }
    }

    mod route_tests {
        use super::*;

        #[test]
        fn test_name_normalized() {
            let route = Route::new("User Profile", &["/users/:id"], ConfigTree::new());
            assert_eq!(route.name(), "userProfile");
        }

        #[test]
        fn test_matching_pattern_prefers_declaration_order() {
            let route = Route::new("user", &["/users/:id", "/users/me"], ConfigTree::new());
            assert_eq!(
                route.matching_pattern("/users/me").map(PathPattern::pattern),
                Some("/users/:id")
            );
            assert!(route.matching_pattern("/teams/1").is_none());
        }

        #[test]
        fn test_href_fills_first_pattern_with_matching_count() {
            let route = Route::new(
                "user",
                &["/users", "/users/:id", "/teams/:team/users/:id", "/people/:id"],
                ConfigTree::new(),
            );
            assert_eq!(
                route.href(&["42"], EmptyParamsPath::Last),
                Some("/users/42".to_string())
            );
            assert_eq!(
                route.href(&["a", "b"], EmptyParamsPath::Last),
                Some("/teams/a/users/b".to_string())
            );
            assert_eq!(route.href(&["a", "b", "c"], EmptyParamsPath::Last), None);
        }

        #[test]
        fn test_href_without_params_picks_first_or_last() {
            let route = Route::new("home", &["/", "/home"], ConfigTree::new());
            let none: [&str; 0] = [];
            assert_eq!(route.href(&none, EmptyParamsPath::Last), Some("/home".to_string()));
            assert_eq!(route.href(&none, EmptyParamsPath::First), Some("/".to_string()));

            let shell = Route::new("shell", &[] as &[&str], ConfigTree::new());
            assert_eq!(shell.href(&none, EmptyParamsPath::Last), None);
        }

        #[test]
        fn test_helpers_debug_lists_names() {
            let route = Route::new("login", &["/login"], ConfigTree::new())
                .with_helper("greeting text", |_, _| Ok(Value::Null));
            assert!(route.helpers().contains_key("greetingText"));
            assert!(format!("{route:?}").contains("greetingText"));
        }
    }
}
