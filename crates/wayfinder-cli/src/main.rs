//! Wayfinder CLI: inspect and validate page routes
//!
//! ## Usage
//!
//! ```bash
//! wayfinder routes                          # List routes and patterns
//! wayfinder resolve /users/42               # Route and params for a URL
//! wayfinder selector /login "form:submit"   # CSS for a compound id
//! wayfinder href userProfile 42             # URL a visit would open
//! wayfinder check                           # Fail on overlapping routes
//! ```

use clap::Parser;
use std::process::ExitCode;
use wayfinder_cli::{logging, Cli, ColorChoice, Verbosity};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(
        Verbosity::from_flags(cli.quiet, cli.verbose),
        ColorChoice::from(cli.color).should_color(),
    );

    match wayfinder_cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
