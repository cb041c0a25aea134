//! Hidden worker command used by the process backend

use anyhow::Result;
use std::io::{self, BufWriter};

use crate::parallel::process::serve;

/// Serve batches from stdin until the parent closes it
pub fn execute() -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(stdin.lock(), BufWriter::new(stdout.lock()))?;
    Ok(())
}
