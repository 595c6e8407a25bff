//! CLI type definitions: command enums and argument structs.

use clap::{Parser, Subcommand};

use proton_shelf_core::{DisplayFilter, SortMethod};

#[derive(Parser)]
#[command(name = "proton-shelf")]
#[command(about = "Scan, resolve and launch a Windows game library", long_about = None)]
pub(crate) struct Cli {
    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Scan all sources and resolve store metadata
    Scan,

    /// List library entries the way the launcher shell orders them
    List {
        /// Override the stored display filter (all, favorites, compatible)
        #[arg(long)]
        filter: Option<DisplayFilter>,

        /// Override the stored sort method (last-launch, play-time, name, anti-cheat)
        #[arg(long)]
        sort: Option<SortMethod>,
    },

    /// Show one entry in full detail
    Show {
        /// Entry id as printed by 'list'
        id: String,
    },

    /// Toggle an entry's favorite flag
    Favorite {
        /// Entry id as printed by 'list'
        id: String,
    },

    /// Launch an entry and record the session
    Launch {
        /// Entry id as printed by 'list'
        id: String,

        /// Print the command and environment without running anything
        #[arg(short = 'n', long)]
        print_only: bool,
    },

    /// Read and write launcher preferences
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print one preference value (section.key)
    Get { key: String },

    /// Set a preference value (section.key)
    Set { key: String, value: String },

    /// Print the preferences file path
    Path,
}
