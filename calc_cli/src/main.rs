//! # Matcalc CLI
//!
//! Command line front end for the material catalog and the weight/cost
//! calculator in `calc_core`.
//!
//! ```text
//! matcalc add --name "MS Flat" --kind length-based --weight-per-meter 2.5
//! matcalc list
//! matcalc calc <material-id> --length 4 --quantity 3 --rate 100
//! ```

mod cli;
mod commands;
mod config;
mod output;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
