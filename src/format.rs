//! External formatter invocation.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::FormatterConfig;
use crate::error::MiddlewarerError;

/// Pipes `source` through the configured formatter and returns its stdout.
///
/// The formatter must read all of stdin before writing output (as `rustfmt`
/// does); the call blocks until it exits.
pub fn format_source(source: &str, formatter: &FormatterConfig) -> Result<String, MiddlewarerError> {
    let (program, args) = match formatter {
        FormatterConfig::Disabled => return Ok(source.to_string()),
        FormatterConfig::Command { program, args } => (program, args),
    };
    debug!(program = %program, ?args, bytes = source.len(), "running formatter");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| MiddlewarerError::FormatError {
            message: format!("failed to start '{program}': {e}"),
            stderr: String::new(),
        })?;

    let write_result = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(source.as_bytes()),
        None => Ok(()),
    };

    let output = child
        .wait_with_output()
        .map_err(|e| MiddlewarerError::FormatError {
            message: format!("failed to wait for '{program}': {e}"),
            stderr: String::new(),
        })?;
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(MiddlewarerError::FormatError {
            message: format!("'{program}' exited with {}", output.status),
            stderr,
        });
    }
    if let Err(e) = write_result {
        return Err(MiddlewarerError::FormatError {
            message: format!("failed to write generated code to '{program}': {e}"),
            stderr,
        });
    }

    String::from_utf8(output.stdout).map_err(|e| MiddlewarerError::FormatError {
        message: format!("'{program}' produced non-UTF-8 output: {e}"),
        stderr,
    })
}
