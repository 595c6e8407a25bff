//! proton-shelf CLI
//!
//! Command-line front end for the game catalog engine: scans the configured
//! sources, resolves store metadata and prints the library the way the
//! launcher shell would render it.

mod cli_types;
mod commands;
mod error;

use std::io::Write;

use clap::Parser;
use log::LevelFilter;

use cli_types::{Cli, Commands, ConfigAction};
pub(crate) use error::CliError;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Scan => commands::scan::run_scan(cli.quiet),
        Commands::List { filter, sort } => commands::list::run_list(filter, sort),
        Commands::Show { id } => commands::show::run_show(&id),
        Commands::Favorite { id } => commands::favorite::run_favorite(&id),
        Commands::Launch { id, print_only } => commands::launch::run_launch(&id, print_only),
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => commands::config::run_config_get(&key),
            ConfigAction::Set { key, value } => commands::config::run_config_set(&key, &value),
            ConfigAction::Path => commands::config::run_config_path(),
        },
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

/// Route log records to stdout: bare messages at the default level, full
/// timestamped records under --verbose. RUST_LOG still wins when set.
fn init_logging(quiet: bool, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .target(env_logger::Target::Stdout);
    if !verbose {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }
    builder.parse_default_env();
    builder.init();
}
