//! Cat command - Concatenate streams to standard output.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use sluice::prelude::*;

/// Arguments for the cat command.
#[derive(Args)]
pub struct CatArgs {
    /// Files to concatenate; `-` or no files reads standard input
    pub files: Vec<PathBuf>,

    /// End-of-line marker used for line-oriented reads
    #[arg(long)]
    pub eol: Option<String>,
}

/// Execute the cat command.
pub fn execute(args: CatArgs) -> Result<()> {
    let mut builder = Sluice::builder();
    if let Some(eol) = &args.eol {
        builder = builder.with_eol(eol.clone());
    }
    let runtime = builder.build();

    let mut std = runtime
        .std_streams()
        .context("Failed to open standard streams")?;
    let (input, output, _) = std.split();

    if args.files.is_empty() {
        output
            .write_from(&mut *input, None)
            .context("Failed to copy standard input")?;
        return Ok(());
    }

    for path in &args.files {
        if path.as_os_str() == "-" {
            output
                .write_from(&mut *input, None)
                .context("Failed to copy standard input")?;
            continue;
        }
        let mut stream = runtime
            .open(path, "r")
            .with_context(|| format!("Failed to open {}", path.display()))?;
        output
            .write_from(&mut stream, None)
            .with_context(|| format!("Failed to copy {}", path.display()))?;
    }

    Ok(())
}
