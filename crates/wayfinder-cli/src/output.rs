//! Output formatting

use crate::error::CliResult;
use console::{style, Term};
use serde::{Deserialize, Serialize};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// A command result that can be printed as text or JSON
pub trait Render: Serialize {
    /// Text lines for the result
    fn render_text(&self, styled: bool) -> Vec<String>;
}

/// Writes command results to stdout and status lines to stderr
#[derive(Debug)]
pub struct Reporter {
    out: Term,
    err: Term,
    /// Output format
    pub format: OutputFormat,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::Text, true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            format,
            use_color,
            quiet,
        }
    }

    /// Print a command result in the configured format
    pub fn emit<R: Render>(&self, result: &R) -> CliResult<()> {
        match self.format {
            OutputFormat::Json => {
                self.out.write_line(&serde_json::to_string_pretty(result)?)?;
            }
            OutputFormat::Text => {
                for line in result.render_text(self.use_color) {
                    self.out.write_line(&line)?;
                }
            }
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet || self.format == OutputFormat::Json {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }
}

/// Style a route or page name
#[must_use]
pub fn name(text: &str, styled: bool) -> String {
    if styled {
        style(text).cyan().bold().to_string()
    } else {
        text.to_string()
    }
}

/// Style a secondary value such as a pattern or selector
#[must_use]
pub fn dim(text: &str, styled: bool) -> String {
    if styled {
        style(text).dim().to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
        let reporter = Reporter::default();
        assert!(reporter.use_color);
        assert!(!reporter.quiet);
    }

    #[test]
    fn test_unstyled_helpers_are_plain() {
        assert_eq!(name("login", false), "login");
        assert_eq!(dim("/login", false), "/login");
    }

    #[test]
    fn test_styled_name_keeps_text() {
        assert!(name("login", true).contains("login"));
    }
}
