//! Wayfinder CLI Library
//!
//! Command-line interface for inspecting and validating Wayfinder route
//! definitions.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{Cli, ColorArg, Commands, FormatArg, HrefArgs, ResolveArgs, SelectorArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, Render, Reporter};

/// Build the CLI configuration from parsed arguments
#[must_use]
pub fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_format(cli.format.into())
        .with_config_path(cli.config.clone())
        .with_routes_root(cli.routes.clone())
}

/// Run a parsed command
pub fn run(cli: Cli) -> CliResult<()> {
    let config = build_config(&cli);
    let reporter = Reporter::new(
        config.format,
        config.color.should_color(),
        config.verbosity.is_quiet(),
    );
    let harness = handlers::load_harness(&config)?;

    let table = || handlers::load_table(&harness);
    match cli.command {
        Commands::Routes => handlers::execute_routes(&reporter, &table()?),
        Commands::Resolve(args) => handlers::execute_resolve(&reporter, &table()?, &args.url),
        Commands::Selector(args) => {
            handlers::execute_selector(&reporter, &table()?, &args.url, &args.id)
        }
        Commands::Href(args) => {
            handlers::execute_href(&reporter, &harness, &table()?, &args.page, &args.params)
        }
        // check reports broken tables instead of failing to load them
        Commands::Check => handlers::execute_check(&reporter, &harness),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_build_config_from_flags() {
        let cli = Cli::try_parse_from([
            "wayfinder", "-q", "--color", "never", "--format", "json", "routes",
        ])
        .unwrap();
        let config = build_config(&cli);
        assert_eq!(config.verbosity, Verbosity::Quiet);
        assert_eq!(config.color, ColorChoice::Never);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_run_routes_against_fixture() {
        let dir = handlers::fixtures::project(handlers::fixtures::SHOP_ROUTES);
        let root = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["wayfinder", "--routes", root, "-q", "routes"]).unwrap();
        run(cli).unwrap();
    }

    #[test]
    fn test_run_resolve_unknown_url_fails() {
        let dir = handlers::fixtures::project(handlers::fixtures::SHOP_ROUTES);
        let root = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["wayfinder", "--routes", root, "resolve", "/cart"]).unwrap();
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("/cart"));
    }

    #[test]
    fn test_run_check_reports_table_that_fails_to_load() {
        let dir = handlers::fixtures::project(handlers::fixtures::SHOP_ROUTES);
        handlers::fixtures::write_routes(
            dir.path(),
            "admin/features/routes.yml",
            "login:\n  path: /admin/login\n",
        );
        let root = dir.path().to_str().unwrap();

        let routes = Cli::try_parse_from(["wayfinder", "--routes", root, "-q", "routes"]).unwrap();
        assert!(matches!(run(routes).unwrap_err(), CliError::Wayfinder(_)));

        let check = Cli::try_parse_from(["wayfinder", "--routes", root, "-q", "check"]).unwrap();
        assert!(matches!(run(check).unwrap_err(), CliError::CheckFailed { problems: 1 }));
    }
}
