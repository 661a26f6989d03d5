//! Error adapter for converting CliError to miette diagnostics.
//!
//! This module provides the bridge between the CLI's standard error types
//! and miette's rich diagnostic formatting. JSON decoding errors get a
//! labelled span at the line and column serde_json reports; everything
//! else is rendered as a plain diagnostic with a code.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, LabeledSpan, SourceSpan};

use crate::{config::ConfigError, error::CliError};

/// Adapter for a JSON decoding error with its source text.
pub struct JsonAdapter<'a> {
    path: &'a str,
    src: &'a str,
    err: &'a serde_json::Error,
}

impl<'a> JsonAdapter<'a> {
    pub fn new(path: &'a str, src: &'a str, err: &'a serde_json::Error) -> Self {
        Self { path, src, err }
    }

    fn span(&self) -> SourceSpan {
        let offset = byte_offset(self.src, self.err.line(), self.err.column());
        let len = usize::from(offset < self.src.len());
        SourceSpan::new(offset.into(), len)
    }
}

impl fmt::Debug for JsonAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonAdapter")
            .field("path", &self.path)
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for JsonAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid JSON in `{}`", self.path)
    }
}

impl std::error::Error for JsonAdapter<'_> {}

impl MietteDiagnostic for JsonAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("tierline::json"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.err.classify() {
            serde_json::error::Category::Data => {
                "symbols need `id`, `elementId` and an `elementType` of Bus, LineBranch, \
                 TransformerBranch, Switch, Source, Generator or Load"
            }
            serde_json::error::Category::Eof => "the document ends early",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_primary_with_span(Some(self.err.to_string()), self.span());
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for [`CliError`] variants without source locations.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Io(_) => "tierline::io",
            CliError::Json { .. } => "tierline::json",
            CliError::Config(_) => "tierline::config",
            CliError::Encode(_) => "tierline::encode",
            CliError::Collisions { .. } => "tierline::collisions",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            CliError::Config(ConfigError::Validation(_)) => {
                "grid_size must be positive; clearances, spacings and sizes must not be negative"
            }
            CliError::Collisions { .. } => "run `tierline layout` to compute collision-free positions",
            _ => return None,
        };
        Some(Box::new(help))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A JSON error with source location information.
    Json(JsonAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Json(j) => fmt::Display::fmt(j, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Json(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Json(j) => j.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Json(j) => j.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Json(j) => j.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Json(j) => j.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Converts a 1-based line and column into a byte offset into `src`.
///
/// Column 0 (serde_json's value for errors at a line start or EOF) maps to
/// the start of the line. Out-of-range positions clamp to the end of input.
fn byte_offset(src: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in src.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let column = column.saturating_sub(1).min(text.len());
            let mut at = offset + column;
            while !src.is_char_boundary(at) {
                at -= 1;
            }
            return at;
        }
        offset += text.len();
    }
    src.len()
}

/// Convert a [`CliError`] into a list of reportable errors.
pub fn to_reportables(err: &CliError) -> Vec<Reportable<'_>> {
    match err {
        CliError::Json { path, src, source } => {
            vec![Reportable::Json(JsonAdapter::new(path, src, source))]
        }
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

/// Renders every diagnostic of `err` with miette's graphical handler.
///
/// A diagnostic the handler fails to draw falls back to its plain message.
pub fn render_reports(err: &CliError) -> Vec<String> {
    let handler = GraphicalReportHandler::new();
    to_reportables(err)
        .iter()
        .map(|reportable| {
            let mut out = String::new();
            match handler.render_report(&mut out, reportable) {
                Ok(()) => out,
                Err(_) => reportable.to_string(),
            }
        })
        .collect()
}
