//! Harness configuration.
//!
//! ```yaml
//! base_url: https://shop.test
//! default_timeout_ms: 5000
//! poll_interval_ms: 50
//! retry_backoff_ms: 150
//! empty_params_path: last
//! routes:
//!   root: ./tests
//!   pattern: "**/features/routes.*"
//! ```

use crate::result::{WayfinderError, WayfinderResult};
use crate::retry::{RetryPolicy, DEFAULT_RETRY_BACKOFF_MS};
use crate::source::{GlobRouteLoader, DEFAULT_ROUTES_PATTERN};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`HarnessConfig::base_url`]
pub const ENV_BASE_URL: &str = "WAYFINDER_BASE_URL";

/// Environment variable overriding [`HarnessConfig::default_timeout_ms`]
pub const ENV_TIMEOUT_MS: &str = "WAYFINDER_TIMEOUT_MS";

/// Which declared path `visit` uses when called without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyParamsPath {
    /// First declared path
    First,
    /// Last declared path
    #[default]
    Last,
}

/// Where route files are discovered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    /// Discovery root
    pub root: PathBuf,
    /// Glob pattern relative to the root
    pub pattern: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            pattern: DEFAULT_ROUTES_PATTERN.to_string(),
        }
    }
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Prefix joined onto visited paths
    pub base_url: Option<String>,
    /// Timeout for waits that are not given one
    pub default_timeout_ms: u64,
    /// Interval between polls
    pub poll_interval_ms: u64,
    /// Pause before retrying an interaction
    pub retry_backoff_ms: u64,
    /// Path used by `visit` without parameters
    pub empty_params_path: EmptyParamsPath,
    /// Route discovery
    pub routes: RoutesConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            empty_params_path: EmptyParamsPath::default(),
            routes: RoutesConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Create with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from YAML text
    pub fn from_yaml_str(text: &str) -> WayfinderResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read from a YAML file
    pub fn from_path(path: &Path) -> WayfinderResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WayfinderError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text).map_err(|e| {
            WayfinderError::invalid_config(format!("{}: {e}", path.display()))
        })
    }

    /// Apply `WAYFINDER_*` environment overrides
    pub fn apply_env(self) -> WayfinderResult<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> WayfinderResult<Self> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.default_timeout_ms = raw.trim().parse().map_err(|_| {
                WayfinderError::invalid_config(format!(
                    "{ENV_TIMEOUT_MS} must be milliseconds, got \"{raw}\""
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> WayfinderResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(WayfinderError::invalid_config(
                "poll_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the default timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    /// Set the poll interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the retry backoff in milliseconds
    #[must_use]
    pub const fn with_retry_backoff(mut self, backoff_ms: u64) -> Self {
        self.retry_backoff_ms = backoff_ms;
        self
    }

    /// Set which path `visit` uses without parameters
    #[must_use]
    pub const fn with_empty_params_path(mut self, choice: EmptyParamsPath) -> Self {
        self.empty_params_path = choice;
        self
    }

    /// Set the route discovery root
    #[must_use]
    pub fn with_routes_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.routes.root = root.into();
        self
    }

    /// Set the route discovery pattern
    #[must_use]
    pub fn with_routes_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.routes.pattern = pattern.into();
        self
    }

    /// Wait options, with an optional per-call timeout
    #[must_use]
    pub fn wait_options(&self, timeout_ms: Option<u64>) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(timeout_ms.unwrap_or(self.default_timeout_ms))
            .with_poll_interval(self.poll_interval_ms)
    }

    /// Retry policy for an interaction
    #[must_use]
    pub const fn retry_policy(&self, retries: u32) -> RetryPolicy {
        RetryPolicy::new(retries).with_backoff(Duration::from_millis(self.retry_backoff_ms))
    }

    /// Absolute URL for a route path, joined onto the base URL when set
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        }
    }

    /// Route loader for the configured discovery settings
    #[must_use]
    pub fn route_loader(&self) -> GlobRouteLoader {
        GlobRouteLoader::new(&self.routes.root).with_pattern(&self.routes.pattern)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = HarnessConfig::default();
            assert_eq!(config.default_timeout_ms, 10_000);
            assert_eq!(config.poll_interval_ms, 50);
            assert_eq!(config.retry_backoff_ms, 150);
            assert_eq!(config.empty_params_path, EmptyParamsPath::Last);
            assert_eq!(config.routes.pattern, DEFAULT_ROUTES_PATTERN);
        }

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = HarnessConfig::from_yaml_str(
                "base_url: https://shop.test\nempty_params_path: first\nroutes:\n  root: tests\n",
            )
            .unwrap();
            assert_eq!(config.base_url.as_deref(), Some("https://shop.test"));
            assert_eq!(config.empty_params_path, EmptyParamsPath::First);
            assert_eq!(config.routes.root, PathBuf::from("tests"));
            assert_eq!(config.routes.pattern, DEFAULT_ROUTES_PATTERN);
            assert_eq!(config.default_timeout_ms, 10_000);
        }

        #[test]
        fn test_unknown_key_rejected() {
            assert!(HarnessConfig::from_yaml_str("timeout: 5\n").is_err());
        }

        #[test]
        fn test_zero_poll_interval_rejected() {
            let err = HarnessConfig::from_yaml_str("poll_interval_ms: 0\n").unwrap_err();
            assert!(matches!(err, WayfinderError::InvalidConfig { .. }));
        }

        #[test]
        fn test_from_path() {
            let tmp = tempfile::NamedTempFile::new().unwrap();
            std::fs::write(tmp.path(), "default_timeout_ms: 2500\n").unwrap();
            let config = HarnessConfig::from_path(tmp.path()).unwrap();
            assert_eq!(config.default_timeout_ms, 2500);
        }

        #[test]
        fn test_missing_file_names_path() {
            let err = HarnessConfig::from_path(Path::new("/no/such/wayfinder.yaml")).unwrap_err();
            assert!(err.to_string().contains("wayfinder.yaml"));
        }
    }

    mod env_tests {
        use super::*;

        fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect()
        }

        #[test]
        fn test_env_overrides() {
            let env = vars(&[(ENV_BASE_URL, "http://localhost:3000"), (ENV_TIMEOUT_MS, "750")]);
            let config = HarnessConfig::new()
                .with_base_url("https://shop.test")
                .apply_env_from(|k| env.get(k).cloned())
                .unwrap();
            assert_eq!(config.base_url.as_deref(), Some("http://localhost:3000"));
            assert_eq!(config.default_timeout_ms, 750);
        }

        #[test]
        fn test_bad_timeout_env() {
            let env = vars(&[(ENV_TIMEOUT_MS, "soon")]);
            let err = HarnessConfig::new()
                .apply_env_from(|k| env.get(k).cloned())
                .unwrap_err();
            assert!(err.to_string().contains("soon"));
        }
    }

    mod derived_tests {
        use super::*;

        #[test]
        fn test_wait_options() {
            let config = HarnessConfig::new().with_timeout(400).with_poll_interval(20);
            assert_eq!(config.wait_options(None).timeout_ms, 400);
            assert_eq!(config.wait_options(Some(90)).timeout_ms, 90);
            assert_eq!(config.wait_options(None).poll_interval_ms, 20);
        }

        #[test]
        fn test_url_for() {
            assert_eq!(HarnessConfig::new().url_for("/login"), "/login");
            let config = HarnessConfig::new().with_base_url("https://shop.test/");
            assert_eq!(config.url_for("/users/42"), "https://shop.test/users/42");
            assert_eq!(config.url_for("login"), "https://shop.test/login");
        }

        #[test]
        fn test_retry_policy() {
            let policy = HarnessConfig::new().with_retry_backoff(10).retry_policy(2);
            assert_eq!(policy.retries, 2);
            assert_eq!(policy.backoff, Duration::from_millis(10));
        }
    }
}
