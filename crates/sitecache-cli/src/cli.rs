//! Command-line interface

use clap::{Parser, Subcommand};

/// Sitecache operator console - connectivity, feature and performance reports
#[derive(Parser, Debug)]
#[command(name = "sitecache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Probe every catalogued backend route
    Probe,

    /// Check the routes behind one feature
    Check {
        /// Feature name, e.g. Stock (case-insensitive)
        feature: String,
    },

    /// Load the stock dashboard (slow stock route on its own channel)
    Stock,

    /// Show rolling performance summaries
    Perf {
        /// Wipe the stored performance logs instead
        #[arg(long)]
        clear: bool,
    },

    /// Probe all routes, then list slow operations
    Audit,
}
