use std::{io, path::PathBuf, process::ExitCode};

use clap::Parser;
use middlewarer::{run, Config, FormatterConfig, MiddlewarerError, Outcome};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "middlewarer")]
#[command(about = "Generate a per-method middleware wrapper for a Rust trait", long_about = None)]
struct Cli {
    /// The trait to wrap
    #[arg(short = 't', long = "type", value_name = "NAME")]
    type_name: String,

    /// Output file; defaults to <type>_middleware.rs next to the unit's child modules
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the generated code to stdout instead of a file
    #[arg(short, long)]
    debug: bool,

    /// Crate directory, module directory or source file containing the trait
    #[arg(short, long, default_value = ".")]
    source: PathBuf,

    /// Formatter program that reads source on stdin and writes it to stdout
    #[arg(long, value_name = "PROGRAM", conflicts_with = "no_format")]
    formatter: Option<String>,

    /// Skip the external formatter
    #[arg(long)]
    no_format: bool,

    /// Print the generated names and signatures as JSON instead of code
    #[arg(long)]
    describe: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let invocation: Vec<String> = std::env::args().skip(1).collect();
    let cli = Cli::parse();

    match build_config(cli, invocation).and_then(|config| run(&config, &mut io::stdout())) {
        Ok(Outcome::Written(path)) => {
            eprintln!("wrote: {}", path.display());
            ExitCode::SUCCESS
        }
        Ok(Outcome::Printed) => ExitCode::SUCCESS,
        Err(err) => {
            error!(stage = err.stage(), "generation failed");
            eprintln!("middlewarer: {}: {err}", err.stage());
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: Cli, invocation: Vec<String>) -> Result<Config, MiddlewarerError> {
    let formatter = if cli.no_format {
        FormatterConfig::Disabled
    } else {
        match cli.formatter {
            Some(program) => FormatterConfig::Command {
                program,
                args: Vec::new(),
            },
            None => FormatterConfig::rustfmt(),
        }
    };

    Ok(Config::new(cli.type_name)?
        .with_source(cli.source)
        .with_output(cli.output)
        .with_debug(cli.debug)
        .with_describe(cli.describe)
        .with_formatter(formatter)
        .with_invocation(invocation))
}
