//! Check command handler
//!
//! Loads every route file independently so one broken file does not hide
//! problems in the others, then looks for duplicate names and for pairs of
//! patterns that some concrete path would match at once.

use crate::error::{CliError, CliResult};
use crate::output::{dim, name, Render, Reporter};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;
use wayfinder::{source, HarnessConfig, Route, RouteTable, WayfinderError};

/// Kind of problem found by the check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// A route file could not be read or parsed
    Source,
    /// A route name is defined more than once
    Duplicate,
    /// Two route patterns can match the same path
    Overlap,
}

/// A single problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Problem kind
    pub kind: ProblemKind,
    /// Description
    pub message: String,
}

/// Result of checking the route files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Route files examined
    pub files: Vec<String>,
    /// Routes loaded
    pub routes: usize,
    /// Problems that fail the check
    pub problems: Vec<Problem>,
    /// Notes that do not fail the check
    pub warnings: Vec<String>,
}

impl CheckReport {
    /// Whether the check passed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

impl Render for CheckReport {
    fn render_text(&self, styled: bool) -> Vec<String> {
        let mut lines = vec![format!(
            "{} route(s) in {} file(s)",
            self.routes,
            self.files.len()
        )];
        lines.extend(
            self.files
                .iter()
                .map(|file| format!("  {}", dim(file, styled))),
        );
        lines.extend(self.warnings.iter().map(|w| format!("warning: {w}")));
        lines.extend(self.problems.iter().map(|p| {
            let kind = format!("{:?}", p.kind).to_lowercase();
            format!("{}: {}", name(&kind, styled), p.message)
        }));
        lines
    }
}

fn problem(kind: ProblemKind, message: String) -> Problem {
    Problem { kind, message }
}

/// Check every route file the harness configuration discovers
pub fn check_routes(harness: &HarnessConfig) -> CliResult<CheckReport> {
    let files = harness.route_loader().discover()?;
    let mut problems = Vec::new();
    let mut routes: Vec<Route> = Vec::new();

    for file in &files {
        match source::load_file(file) {
            Ok(loaded) => {
                debug!(file = %file.display(), routes = loaded.len(), "route file checked");
                routes.extend(loaded);
            }
            Err(err) => problems.push(problem(ProblemKind::Source, err.to_string())),
        }
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for route in &routes {
        *counts.entry(route.name().to_string()).or_default() += 1;
    }
    for (route, count) in counts.iter().filter(|(_, count)| **count > 1) {
        problems.push(problem(
            ProblemKind::Duplicate,
            format!("route \"{route}\" is defined {count} times"),
        ));
    }

    let warnings = routes
        .iter()
        .filter(|r| r.paths().is_empty())
        .map(|r| format!("route \"{}\" has no paths and cannot be visited", r.name()))
        .collect();

    let total = routes.len();
    let mut seen = HashSet::new();
    routes.retain(|r| seen.insert(r.name().to_string()));
    let table = RouteTable::new(routes)?;
    for (a, pattern_a, b, pattern_b) in table.overlaps() {
        problems.push(problem(
            ProblemKind::Overlap,
            format!("\"{a}\" ({pattern_a}) and \"{b}\" ({pattern_b}) can match the same path"),
        ));
    }

    Ok(CheckReport {
        files: files.iter().map(|f| f.display().to_string()).collect(),
        routes: total,
        problems,
        warnings,
    })
}

/// Execute the check command
pub fn execute_check(reporter: &Reporter, harness: &HarnessConfig) -> CliResult<()> {
    let report = check_routes(harness)?;
    if report.files.is_empty() {
        return Err(WayfinderError::RouteSource {
            path: harness
                .routes
                .root
                .join(&harness.routes.pattern)
                .display()
                .to_string(),
            message: "no route files found".to_string(),
        }
        .into());
    }
    reporter.emit(&report)?;
    if report.is_clean() {
        reporter.success("routes are unambiguous");
        Ok(())
    } else {
        for p in &report.problems {
            reporter.failure(&p.message);
        }
        Err(CliError::CheckFailed {
            problems: report.problems.len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::handlers::fixtures::{project, write_routes, SHOP_ROUTES};

    fn harness_for(dir: &tempfile::TempDir) -> HarnessConfig {
        HarnessConfig::new().with_routes_root(dir.path())
    }

    #[test]
    fn test_clean_routes() {
        let dir = project(SHOP_ROUTES);
        let report = check_routes(&harness_for(&dir)).unwrap();
        assert!(report.is_clean(), "{:?}", report.problems);
        assert_eq!(report.routes, 2);
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn test_duplicate_home_path_is_an_overlap() {
        let dir = project("home:\n  path: [/, /home]\nlanding:\n  path: /home\n");
        let report = check_routes(&harness_for(&dir)).unwrap();
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].kind, ProblemKind::Overlap);
        assert!(report.problems[0].message.contains("\"home\" (/home)"));
        assert!(report.problems[0].message.contains("\"landing\" (/home)"));
    }

    #[test]
    fn test_param_pattern_overlaps_literal() {
        let dir = project("user:\n  path: /users/:id\nnewUser:\n  path: /users/new\n");
        let report = check_routes(&harness_for(&dir)).unwrap();
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].kind, ProblemKind::Overlap);
    }

    #[test]
    fn test_duplicates_across_files() {
        let dir = project("login:\n  path: /login\n");
        write_routes(dir.path(), "admin/features/routes.yml", "login:\n  path: /admin/login\n");
        let report = check_routes(&harness_for(&dir)).unwrap();
        assert_eq!(report.routes, 2);
        assert!(report
            .problems
            .iter()
            .any(|p| p.kind == ProblemKind::Duplicate && p.message.contains("2 times")));
    }

    #[test]
    fn test_broken_file_does_not_hide_others() {
        let dir = project(SHOP_ROUTES);
        write_routes(dir.path(), "broken/features/routes.yml", "login:\n  path: [/login\n");
        let report = check_routes(&harness_for(&dir)).unwrap();
        assert_eq!(report.routes, 2);
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].kind, ProblemKind::Source);
    }

    #[test]
    fn test_pathless_route_warns() {
        let dir = project("shell:\n  pageObject:\n    nav: nav\n");
        let report = check_routes(&harness_for(&dir)).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_text_rendering() {
        let dir = project("home:\n  path: /home\nlanding:\n  path: /home\n");
        let lines = check_routes(&harness_for(&dir)).unwrap().render_text(false);
        assert!(lines[0].starts_with("2 route(s) in 1 file(s)"));
        assert!(lines.iter().any(|l| l.starts_with("overlap: ")));
    }
}
