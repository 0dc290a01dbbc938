//! Writes the `sample.h5` conformance fixture.
//!
//! ```bash
//! h5fixture --output dist/sample.h5 --allow-platform-gaps
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use h5fixture::{FixtureConfig, DEFAULT_OUTPUT};
use tracing_subscriber::EnvFilter;

/// HDF5 conformance fixture builder
#[derive(Parser, Debug)]
#[command(name = "h5fixture")]
#[command(about = "Write an HDF5 file covering every datatype class")]
struct Args {
    /// Output file; the build fails if it already exists
    #[arg(long, default_value = DEFAULT_OUTPUT, env = "H5FIXTURE_OUTPUT")]
    output: PathBuf,

    /// Skip entries whose type this build cannot encode
    #[arg(long, env = "H5FIXTURE_ALLOW_PLATFORM_GAPS")]
    allow_platform_gaps: bool,

    /// Append bitfield entries after the standard matrix
    #[arg(long, env = "H5FIXTURE_WITH_BITFIELD")]
    with_bitfield: bool,

    /// Log level for the builder (overrides RUST_LOG)
    #[arg(long, env = "H5FIXTURE_LOG_LEVEL")]
    log_level: Option<String>,
}

fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(format!("h5fixture={level}"))
            .with_context(|| format!("invalid log level {level:?}"))?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("h5fixture=info"))
            .context("invalid RUST_LOG")?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    init_tracing(args.log_level.as_deref())?;
    let config = FixtureConfig::new(&args.output)
        .allow_platform_gaps(args.allow_platform_gaps)
        .include_bitfield(args.with_bitfield);
    h5fixture::build(config).with_context(|| format!("building {}", args.output.display()))?;
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
