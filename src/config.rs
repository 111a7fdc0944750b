//! Immutable run configuration built once from the command line.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::MiddlewarerError;
use crate::naming::to_snake_case;

/// Default formatter program; it reads source on stdin and writes it to stdout.
pub const DEFAULT_FORMATTER: &str = "rustfmt";

#[derive(Debug, Clone, PartialEq, Eq)]
/// How emitted text is normalized before it is written.
pub enum FormatterConfig {
    /// Pipe the text through `program args...`.
    Command { program: String, args: Vec<String> },
    /// Write the emitted text as-is.
    Disabled,
}

impl FormatterConfig {
    /// `rustfmt --edition 2021`.
    pub fn rustfmt() -> Self {
        Self::Command {
            program: DEFAULT_FORMATTER.to_string(),
            args: vec!["--edition".to_string(), "2021".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where the formatted artifact goes.
pub enum OutputTarget {
    /// Standard output (`-d`).
    Stdout,
    /// A file, opened only once generation has succeeded.
    File(PathBuf),
}

#[derive(Debug, Clone)]
/// Configuration for a single generator invocation.
pub struct Config {
    /// Name of the trait to wrap.
    pub type_name: String,
    /// Location of the compilation unit (file or directory).
    pub source: PathBuf,
    /// Explicit output path; `None` derives one from the trait name.
    pub output: Option<PathBuf>,
    /// Write to stdout instead of a file.
    pub debug: bool,
    /// Print the wrapper plan as JSON instead of generating code.
    pub describe: bool,
    pub formatter: FormatterConfig,
    /// Arguments the generator was invoked with, recorded in the file header.
    pub invocation: Vec<String>,
}

impl Config {
    /// Builds a configuration with defaults for everything but the trait name.
    ///
    /// Fails with [`MiddlewarerError::ConfigError`] when `type_name` is empty or
    /// not a valid Rust identifier.
    pub fn new(type_name: impl Into<String>) -> Result<Self, MiddlewarerError> {
        let type_name = type_name.into();
        validate_type_name(&type_name)?;
        Ok(Self {
            invocation: vec!["--type".to_string(), type_name.clone()],
            type_name,
            source: PathBuf::from("."),
            output: None,
            debug: false,
            describe: false,
            formatter: FormatterConfig::rustfmt(),
        })
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_describe(mut self, describe: bool) -> Self {
        self.describe = describe;
        self
    }

    pub fn with_formatter(mut self, formatter: FormatterConfig) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_invocation(mut self, invocation: Vec<String>) -> Self {
        self.invocation = invocation;
        self
    }

    /// Default artifact file name, `<snake_case(type)>_middleware.rs`.
    pub fn default_file_name(&self) -> String {
        format!("{}_middleware.rs", to_snake_case(&self.type_name))
    }

    /// Resolves the output target for the unit at `unit_path`.
    ///
    /// Without `--output` the file lands where `mod <name>;` declared in the unit
    /// would look for it: next to crate roots and `mod.rs`, or inside the
    /// `<stem>/` directory for any other file.
    pub fn output_target(&self, unit_path: &Path, crate_root: bool) -> OutputTarget {
        if self.debug {
            return OutputTarget::Stdout;
        }
        if let Some(output) = &self.output {
            return OutputTarget::File(output.clone());
        }
        OutputTarget::File(child_module_dir(unit_path, crate_root).join(self.default_file_name()))
    }
}

/// Directory that holds file modules declared inside `unit_path`.
///
/// Crate roots keep their children alongside them whatever the file is called.
pub fn child_module_dir(unit_path: &Path, crate_root: bool) -> PathBuf {
    let parent = unit_path.parent().unwrap_or(Path::new("."));
    if crate_root {
        return parent.to_path_buf();
    }
    match unit_path.file_stem().and_then(|s| s.to_str()) {
        Some("lib" | "main" | "mod") | None => parent.to_path_buf(),
        Some(stem) => parent.join(stem),
    }
}

fn validate_type_name(name: &str) -> Result<(), MiddlewarerError> {
    static IDENT_RE: OnceLock<Regex> = OnceLock::new();
    let ident_re =
        IDENT_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

    if name.is_empty() {
        return Err(MiddlewarerError::ConfigError(
            "no type name supplied".to_string(),
        ));
    }
    if !ident_re.is_match(name) || name == "_" {
        return Err(MiddlewarerError::ConfigError(format!(
            "'{name}' is not a valid trait identifier"
        )));
    }
    Ok(())
}
