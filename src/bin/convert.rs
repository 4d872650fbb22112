//! SAAP convert - decode a planning workbook into a JSON envelope
//!
//! The output is what the remote deployment serves from its object store.
//!
//! Usage:
//!   saap-convert --input SAAP.xlsx --output saap-data.json

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use saap_sync::{config::LogFormat, convert, decode::LayoutPreset, logging};

#[derive(Parser, Debug)]
#[command(name = "saap-convert")]
#[command(about = "Convert a SAAP planning workbook into a JSON envelope")]
#[command(version)]
struct Args {
    /// Workbook to read
    #[arg(long)]
    input: PathBuf,

    /// JSON file to write
    #[arg(long, default_value = "saap-data.json")]
    output: PathBuf,

    /// Column layout of the workbook
    #[arg(long, value_enum, default_value = "dashboard")]
    layout: LayoutPreset,

    /// Revenue target recorded in the envelope metadata
    #[arg(long, default_value = "1000000")]
    revenue_target: f64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level, LogFormat::Text);

    let envelope = convert::convert_workbook(&args.input, args.layout, args.revenue_target)
        .with_context(|| format!("failed to convert {}", args.input.display()))?;
    convert::write_envelope(&envelope, &args.output)?;

    info!(output = %args.output.display(), "Wrote envelope");
    Ok(())
}
