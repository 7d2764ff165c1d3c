//! Copy command - Copy one stream into another.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use sluice::prelude::*;

use crate::OutputFormat;

/// Arguments for the copy command.
#[derive(Args)]
pub struct CopyArgs {
    /// Source path; `-` for standard input
    #[arg(required = true)]
    pub source: PathBuf,

    /// Destination path
    #[arg(required = true)]
    pub dest: PathBuf,

    /// Copy at most this many bytes
    #[arg(long)]
    pub max_len: Option<u64>,

    /// Append to the destination instead of truncating it
    #[arg(long)]
    pub append: bool,

    /// Refuse to overwrite an existing destination
    #[arg(long)]
    pub no_clobber: bool,
}

/// Copy result.
#[derive(Debug, Serialize)]
struct CopyReport {
    source: String,
    dest: String,
    bytes: u64,
}

/// Execute the copy command.
pub fn execute(args: CopyArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let runtime = Sluice::with_defaults();

    let mut std = runtime
        .std_streams()
        .context("Failed to open standard streams")?;
    let mut from_file;
    let source: &mut Stream = if args.source.as_os_str() == "-" {
        std.input()
    } else {
        from_file = runtime
            .open(&args.source, "r")
            .with_context(|| format!("Failed to open {}", args.source.display()))?;
        &mut from_file
    };

    let mode = if args.append {
        "a"
    } else if args.no_clobber {
        "x"
    } else {
        "w"
    };
    let mut dest = runtime
        .open(&args.dest, mode)
        .with_context(|| format!("Failed to open {}", args.dest.display()))?;

    let bytes = dest
        .write_from(&mut *source, args.max_len)
        .context("Copy failed")?;
    tracing::debug!(bytes, "Copy finished");

    let report = CopyReport {
        source: args.source.display().to_string(),
        dest: args.dest.display().to_string(),
        bytes,
    };

    match format {
        OutputFormat::Human => {
            if !quiet {
                println!("Copied {} bytes: {} -> {}", report.bytes, report.source, report.dest);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    Ok(())
}
