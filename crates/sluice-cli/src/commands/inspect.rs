//! Inspect command - Inspect a stream's capabilities and metadata.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use sluice::prelude::*;

use crate::OutputFormat;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Path to the stream resource
    #[arg(required = true)]
    pub path: PathBuf,

    /// Open mode to inspect the resource with
    #[arg(short, long, default_value = "r")]
    pub mode: String,
}

/// Execute the inspect command.
pub fn execute(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let runtime = Sluice::with_defaults();

    let stream = runtime
        .open(&args.path, &args.mode)
        .with_context(|| format!("Failed to open {}", args.path.display()))?;

    let info = stream.handle().info();
    let kind = stream.kind();

    match format {
        OutputFormat::Human => {
            println!("Stream: {}", args.path.display());
            println!("Variant: {}", kind);
            println!("Mode: {}", info.mode);
            println!("Endpoint: {}", info.kind);
            println!("Capabilities: {}", info.capabilities.join(", "));
            println!("Eol: {}", info.eol.escape_debug());
            println!("Eof: {}", info.eof);
            println!("Blocking: {}", info.blocked);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&info)?);
        }
    }

    Ok(())
}
