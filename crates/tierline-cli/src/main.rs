//! Tierline CLI entry point.

use std::process;

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use tierline_cli::{Args, error_adapter::render_reports};

fn init_logging(args: &Args) -> LevelFilter {
    // The logger is not up yet, so a bad level goes straight to stderr.
    let level = args.log_filter().unwrap_or_else(|_| {
        eprintln!("Unknown log level `{}`, falling back to warn", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();
    level
}

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    let log_level = init_logging(&args);
    info!(log_level:?; "Starting Tierline");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = tierline_cli::run(&args) {
        for report in render_reports(&err) {
            error!("{report}");
        }
        process::exit(1);
    }

    info!(command = args.command.name(); "Completed successfully");
}
