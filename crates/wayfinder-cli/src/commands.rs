//! CLI command definitions using clap

use crate::config::ColorChoice;
use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Wayfinder: inspect and validate page routes
#[derive(Parser, Debug)]
#[command(name = "wayfinder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Harness configuration file (YAML)
    #[arg(short, long, global = true, env = "WAYFINDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory searched for route files
    #[arg(short, long, global = true)]
    pub routes: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Output format
    #[arg(long, default_value = "text", global = true)]
    pub format: FormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List routes with their path patterns
    Routes,

    /// Show the route and parameters matching a URL
    Resolve(ResolveArgs),

    /// Show the CSS selector for a compound id on the page at a URL
    Selector(SelectorArgs),

    /// Build the URL a visit to a page would navigate to
    Href(HrefArgs),

    /// Validate route files and report overlapping patterns
    Check,
}

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Browser URL or path
    pub url: String,
}

/// Arguments for the selector command
#[derive(Args, Debug)]
pub struct SelectorArgs {
    /// Browser URL or path
    pub url: String,

    /// Compound id, e.g. `form:submit`
    pub id: String,
}

/// Arguments for the href command
#[derive(Args, Debug)]
pub struct HrefArgs {
    /// Page (route) name
    pub page: String,

    /// Values for the path parameters, in order
    pub params: Vec<String>,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_routes_with_globals() {
            let cli = Cli::try_parse_from([
                "wayfinder", "routes", "--routes", "tests", "-vv", "--format", "json",
            ])
            .unwrap();
            assert!(matches!(cli.command, Commands::Routes));
            assert_eq!(cli.routes, Some(PathBuf::from("tests")));
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.format, FormatArg::Json));
        }

        #[test]
        fn test_selector_args() {
            let cli = Cli::try_parse_from(["wayfinder", "selector", "/login", "form:submit"])
                .unwrap();
            match cli.command {
                Commands::Selector(args) => {
                    assert_eq!(args.url, "/login");
                    assert_eq!(args.id, "form:submit");
                }
                other => panic!("expected selector, got {other:?}"),
            }
        }

        #[test]
        fn test_href_takes_many_params() {
            let cli = Cli::try_parse_from(["wayfinder", "href", "order", "7", "items"]).unwrap();
            match cli.command {
                Commands::Href(args) => {
                    assert_eq!(args.page, "order");
                    assert_eq!(args.params, vec!["7", "items"]);
                }
                other => panic!("expected href, got {other:?}"),
            }
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["wayfinder"]).is_err());
        }
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
        assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
    }
}
