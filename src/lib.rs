//! Generates middleware wrappers for Rust traits.
//!
//! Given a trait name, the generator finds the trait in a crate, and emits a
//! child module with a `<Trait>Middleware` struct that implements the trait by
//! delegating to a wrapped value. Every method can be decorated independently by
//! setting its `<method>_middleware` field.

pub mod assemble;
pub mod config;
pub mod emit;
pub mod error;
pub mod format;
pub mod naming;
pub mod resolve;
pub mod translate;
pub mod types;
pub mod unit;

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::info;

pub use assemble::{MethodPlan, Sections, WrapperSpec};
pub use config::{Config, FormatterConfig, OutputTarget};
pub use emit::Header;
pub use error::MiddlewarerError;
pub use resolve::{resolve_contract, Contract, ResolvedSymbol};
pub use unit::{load_unit, CompilationUnit};

/// Unformatted output of one generation run.
#[derive(Debug, Clone)]
pub struct Generated {
    pub spec: WrapperSpec,
    pub target: OutputTarget,
    /// Header plus sections, before the external formatter runs.
    pub source: String,
}

/// What [`run`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The artifact was written to this file.
    Written(PathBuf),
    /// The artifact or the description went to the provided stdout writer.
    Printed,
}

/// Resolves the configured trait and derives the wrapper plan.
pub fn plan(config: &Config) -> Result<(CompilationUnit, WrapperSpec), MiddlewarerError> {
    let unit = load_unit(&config.source)?;
    let contract = resolve_contract(&unit, &config.type_name)?;
    let spec = WrapperSpec::plan(&contract)?;
    Ok((unit, spec))
}

/// Runs resolution, translation, assembly and emission; no formatting, no I/O
/// beyond reading the unit.
pub fn generate(config: &Config) -> Result<Generated, MiddlewarerError> {
    let (unit, spec) = plan(config)?;
    let sections = spec.assemble();
    let target = config.output_target(&unit.path, unit.is_crate_root());

    let module_name = match &target {
        OutputTarget::File(path) => path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string),
        OutputTarget::Stdout => None,
    };
    let header = Header {
        invocation: config.invocation.clone(),
        contract: spec.contract.clone(),
        source: unit.path.display().to_string(),
        module_name,
        imports: spec.imports.clone(),
    };

    Ok(Generated {
        source: emit::emit_to_string(&header, &sections),
        spec,
        target,
    })
}

/// Renders the wrapper plan as pretty JSON.
pub fn describe(config: &Config) -> Result<String, MiddlewarerError> {
    let (_, spec) = plan(config)?;
    serde_json::to_string_pretty(&spec)
        .map_err(|e| MiddlewarerError::SerializationError(e.to_string()))
}

/// Full generator run: generate, format, then write the artifact.
///
/// The destination file is only created or truncated after every earlier stage
/// has succeeded.
pub fn run(config: &Config, stdout: &mut dyn Write) -> Result<Outcome, MiddlewarerError> {
    if config.describe {
        let description = describe(config)?;
        writeln!(stdout, "{description}")?;
        return Ok(Outcome::Printed);
    }

    let generated = generate(config)?;
    let formatted = format::format_source(&generated.source, &config.formatter)?;

    match generated.target {
        OutputTarget::Stdout => {
            stdout.write_all(formatted.as_bytes())?;
            Ok(Outcome::Printed)
        }
        OutputTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, formatted)?;
            info!(
                output = %path.display(),
                methods = generated.spec.methods.len(),
                "wrote middleware for {}",
                generated.spec.contract
            );
            Ok(Outcome::Written(path))
        }
    }
}
