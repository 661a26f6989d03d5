//! Command-line argument definitions for the Tierline CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand selects the operation; configuration file
//! selection and logging verbosity apply to every subcommand.

use clap::{Parser, Subcommand};
use log::{LevelFilter, ParseLevelError};

/// Command-line arguments for the Tierline layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

impl Args {
    /// Parses `--log-level` into a filter for the logger.
    ///
    /// # Errors
    ///
    /// Returns the parse error for names `log` does not know.
    pub fn log_filter(&self) -> Result<LevelFilter, ParseLevelError> {
        self.log_level.parse()
    }
}

/// Operations on a JSON symbol list
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute grid-aligned positions for every symbol
    Layout {
        /// Path to the input symbol list (JSON array)
        input: String,

        /// Path to the output JSON file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the topology hash of a symbol list
    Hash {
        /// Path to the input symbol list (JSON array)
        input: String,
    },

    /// Report collisions between symbols
    Check {
        /// Path to the input symbol list (JSON array)
        input: String,

        /// Position map or layout output to check instead of the symbols' own positions
        #[arg(short, long)]
        positions: Option<String>,

        /// Clearance to check against (defaults to the configured symbol clearance)
        #[arg(long)]
        clearance: Option<i32>,
    },
}

impl Command {
    /// Path of the symbol list every subcommand reads.
    pub fn input(&self) -> &str {
        match self {
            Command::Layout { input, .. } | Command::Hash { input } | Command::Check { input, .. } => {
                input
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Layout { .. } => "layout",
            Command::Hash { .. } => "hash",
            Command::Check { .. } => "check",
        }
    }
}
