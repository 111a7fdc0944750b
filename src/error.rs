//! Error definitions for every stage of wrapper generation.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
/// Top-level error type returned by public APIs.
pub enum MiddlewarerError {
    /// Invalid or missing invocation input (for example a malformed `--type`).
    #[error("config error: {0}")]
    ConfigError(String),
    /// The compilation unit could not be read or parsed.
    #[error("failed to load '{}': {message}", .path.display())]
    LoadError { path: PathBuf, message: String },
    /// Unit discovery yielded zero or several candidate source files.
    #[error("expected exactly one compilation unit, found {found}{}", render_candidates(.candidates))]
    AmbiguousUnit {
        found: usize,
        candidates: Vec<PathBuf>,
    },
    /// No top-level item with the requested name exists in the unit.
    #[error("couldn't find '{name}' in {}", .unit.display())]
    NotFound { name: String, unit: PathBuf },
    /// The requested name resolves to something other than a trait.
    #[error("'{name}' is a {kind}, not a trait")]
    NotAContract { name: String, kind: &'static str },
    /// The trait exists but has a shape the wrapper cannot implement.
    #[error("trait '{name}' is not supported: {reason}")]
    UnsupportedContract { name: String, reason: String },
    /// The trait declares no methods.
    #[error("trait '{0}' declares no methods; nothing to wrap")]
    EmptyContract(String),
    /// A method signature could not be rendered faithfully.
    #[error("cannot translate method '{method}': {message}")]
    TranslateError { method: String, message: String },
    /// The external formatter failed to start or exited unsuccessfully.
    #[error("format command failed: {message}{}", render_stderr(.stderr))]
    FormatError { message: String, stderr: String },
    /// Output serialization failure (`--describe`).
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// Filesystem I/O error while writing the artifact.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MiddlewarerError {
    /// Short name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "config",
            Self::LoadError { .. }
            | Self::AmbiguousUnit { .. }
            | Self::NotFound { .. }
            | Self::NotAContract { .. }
            | Self::UnsupportedContract { .. }
            | Self::EmptyContract(_) => "resolution",
            Self::TranslateError { .. } => "translation",
            Self::FormatError { .. } => "format",
            Self::SerializationError(_) | Self::Io(_) => "output",
        }
    }

    pub(crate) fn translate(method: &str, message: impl Into<String>) -> Self {
        Self::TranslateError {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

fn render_candidates(candidates: &[PathBuf]) -> String {
    if candidates.is_empty() {
        return String::new();
    }
    let listed: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    format!(" ({})", listed.join(", "))
}

fn render_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\nstderr: {trimmed}")
    }
}
