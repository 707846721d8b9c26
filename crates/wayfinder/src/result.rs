//! Result and error types for Wayfinder.

use thiserror::Error;

/// Result type for Wayfinder operations
pub type WayfinderResult<T> = Result<T, WayfinderError>;

/// Errors that can occur in Wayfinder
#[derive(Debug, Error)]
pub enum WayfinderError {
    /// A compound id segment is not configured in the page object
    #[error("Cannot find \"{segment}\" configured as a component property of \"{id}\" in {context}")]
    PropertyNotFound {
        /// Normalized segment that failed to resolve
        segment: String,
        /// Full compound id being resolved
        id: String,
        /// Page object context (route name)
        context: String,
    },

    /// No route with the given name
    #[error("Route is not defined for \"{page}\" page")]
    RouteNotFound {
        /// Requested page name
        page: String,
    },

    /// No route matches the browser URL
    #[error("Route is not defined for \"{url}\"")]
    RouteNotDefinedForUrl {
        /// Concrete URL (query stripped)
        url: String,
    },

    /// More than one route matches a concrete path
    #[error("Ambiguous path {path} can match any of the routes {}", .routes.join(" and "))]
    AmbiguousRoute {
        /// Concrete path
        path: String,
        /// Names of every matching route
        routes: Vec<String>,
    },

    /// No declared path of the route accepts the given parameters
    #[error("Route \"{page}\" has no path accepting {params} parameter(s)")]
    NoMatchingPath {
        /// Page name
        page: String,
        /// Number of parameters supplied
        params: usize,
    },

    /// Two routes share a normalized name
    #[error("Route \"{name}\" is defined more than once")]
    DuplicateRoute {
        /// Normalized route name
        name: String,
    },

    /// Malformed configuration tree or harness configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// A route source file could not be read or parsed
    #[error("Failed to load routes from {path}: {message}")]
    RouteSource {
        /// Source path
        path: String,
        /// Error message
        message: String,
    },

    /// A polled condition never held within its deadline
    #[error("Waiting {description} timed out after {ms}ms{}", html_suffix(.html.as_deref()))]
    Timeout {
        /// Human-readable condition description
        description: String,
        /// Timeout in milliseconds
        ms: u64,
        /// Outer HTML of the target element, when obtainable
        html: Option<String>,
    },

    /// No element matches the selector
    #[error("No element matches $(\"{selector}\")")]
    ElementNotFound {
        /// CSS selector
        selector: String,
    },

    /// Element handle no longer attached to the document
    #[error("Stale element reference for $(\"{selector}\")")]
    StaleElement {
        /// CSS selector the handle was found with
        selector: String,
    },

    /// Driver round-trip failed
    #[error("Driver error: {message}{}", html_suffix(.html.as_deref()))]
    Driver {
        /// Error message
        message: String,
        /// Outer HTML of the target element, when obtainable
        html: Option<String>,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Page helper not registered
    #[error("Helper \"{name}\" is not defined for page \"{page}\"")]
    UnknownHelper {
        /// Helper name
        name: String,
        /// Route name
        page: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn html_suffix(html: Option<&str>) -> String {
    html.map(|h| format!("\n{h}")).unwrap_or_default()
}

impl WayfinderError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
            html: None,
        }
    }

    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether an interaction may be retried after this error.
    ///
    /// Missing definitions and ambiguous routes are authoring bugs and are
    /// never retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ElementNotFound { .. }
                | Self::StaleElement { .. }
                | Self::Driver { .. }
        )
    }

    /// Attach the target element's outer HTML to timeout and driver errors.
    #[must_use]
    pub fn with_html(self, outer_html: impl Into<String>) -> Self {
        match self {
            Self::Timeout {
                description, ms, ..
            } => Self::Timeout {
                description,
                ms,
                html: Some(outer_html.into()),
            },
            Self::Driver { message, .. } => Self::Driver {
                message,
                html: Some(outer_html.into()),
            },
            other => other,
        }
    }

    /// Outer HTML attached to this error, if any
    #[must_use]
    pub fn html(&self) -> Option<&str> {
        match self {
            Self::Timeout { html, .. } | Self::Driver { html, .. } => html.as_deref(),
            _ => None,
        }
    }
}
