//! CLI logic for the Tierline layout tool.
//!
//! Reads a JSON symbol list, runs one engine operation on it and writes
//! the result as JSON (or the hash as plain text).

pub mod error_adapter;

mod args;
mod config;
mod error;

pub use args::{Args, Command};
pub use config::ConfigError;
pub use error::CliError;

use std::{collections::BTreeMap, fs};

use log::{debug, info, warn};
use serde::{Deserialize, de::DeserializeOwned};

use tierline::{LayoutEngine, config::AppConfig};
use tierline_core::{geometry::Point, identifier::Id, symbol::Symbol};

/// A position file: either a bare `id -> {x, y}` map or a saved layout result.
#[derive(Deserialize)]
#[serde(untagged)]
enum PositionsFile {
    Layout { positions: BTreeMap<Id, Point> },
    Map(BTreeMap<Id, Point>),
}

impl PositionsFile {
    fn into_map(self) -> BTreeMap<Id, Point> {
        match self {
            PositionsFile::Layout { positions } | PositionsFile::Map(positions) => positions,
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, CliError> {
    let src = fs::read_to_string(path)?;
    serde_json::from_str(&src).map_err(|source| CliError::Json {
        path: path.to_string(),
        src,
        source,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(CliError::Encode)
}

/// Run one subcommand and return what it prints.
///
/// `layout` returns the layout result as pretty JSON, `hash` the hex
/// topology hash and `check` the collision report as pretty JSON.
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading or validation errors
/// - Malformed symbol or position files
/// - Collisions found by `check`
pub fn execute(args: &Args) -> Result<String, CliError> {
    let app_config = config::load_config(args.config.as_ref())?;
    execute_with_config(&args.command, &app_config)
}

fn execute_with_config(command: &Command, app_config: &AppConfig) -> Result<String, CliError> {
    let engine = LayoutEngine::new(*app_config.geometry());
    let symbols: Vec<Symbol> = read_json(command.input())?;
    info!(
        command = command.name(),
        input_path = command.input(),
        symbols = symbols.len();
        "Processing symbols"
    );

    match command {
        Command::Layout { .. } => {
            let layout = engine.layout(&symbols);
            debug!(positions = layout.positions().len(); "Layout finished");
            to_json(&layout)
        }
        Command::Hash { .. } => Ok(engine.topology_hash(&symbols).to_string()),
        Command::Check {
            positions,
            clearance,
            ..
        } => {
            let positions = match positions {
                Some(path) => read_json::<PositionsFile>(path)?.into_map(),
                None => BTreeMap::new(),
            };
            let clearance = clearance.unwrap_or(engine.config().symbol_clearance());
            let report = engine.detect_collisions(&symbols, &positions, clearance);

            if report.has_collisions() {
                for pair in report.pairs() {
                    warn!(a = pair.a().as_str(), b = pair.b().as_str(); "Symbols collide");
                }
                return Err(CliError::Collisions {
                    count: report.pairs().len(),
                    clearance,
                });
            }
            to_json(&report)
        }
    }
}

/// Run the Tierline CLI application
///
/// Executes the subcommand and writes its output to the `--output` file
/// when one is given, otherwise to stdout.
///
/// # Errors
///
/// See [`execute`].
pub fn run(args: &Args) -> Result<(), CliError> {
    let output = execute(args)?;

    match &args.command {
        Command::Layout {
            output: Some(path), ..
        } => {
            fs::write(path, output)?;
            info!(output_file = path; "Layout written");
        }
        _ => println!("{output}"),
    }

    Ok(())
}
