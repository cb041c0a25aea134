//! Process-backed workers
//!
//! The pool re-executes the `batchbench` binary as `batchbench worker`. Each
//! child reads one JSON-encoded [`Batch`] per line from stdin and answers with
//! one [`WorkerReply`] line on stdout. Closing stdin tells the child to exit.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use super::core::{Backend, Batch};
use super::pool::{BatchExecutor, ChannelPool};
use crate::workload::Checksum;

/// Subcommand the child is started with
pub const WORKER_SUBCOMMAND: &str = "worker";

/// One line of worker output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReply {
    pub start: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Checksum>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerReply {
    pub fn done(start: usize, results: Vec<Checksum>) -> Self {
        Self {
            start,
            results: Some(results),
            error: None,
        }
    }

    pub fn failed(start: usize, error: String) -> Self {
        Self {
            start,
            results: None,
            error: Some(error),
        }
    }

    fn into_results(self, expected_start: usize) -> Result<Vec<Checksum>> {
        if self.start != expected_start {
            bail!(
                "Worker answered for batch {} while batch {} was pending",
                self.start,
                expected_start
            );
        }
        match (self.results, self.error) {
            (_, Some(error)) => Err(anyhow!("Worker process reported: {error}")),
            (Some(results), None) => Ok(results),
            (None, None) => bail!("Worker reply for batch {} carried no results", self.start),
        }
    }
}

/// Child side of the protocol: serve batches until `input` reaches EOF.
///
/// Job failures are reported back as [`WorkerReply::failed`]; only I/O and
/// decoding problems end the loop with an error. Returns the number of batches
/// served.
pub fn serve<R: BufRead, W: Write>(input: R, mut output: W) -> Result<usize> {
    let mut served = 0;

    for line in input.lines() {
        let line = line.context("Failed to read batch request")?;
        if line.trim().is_empty() {
            continue;
        }

        let batch: Batch = serde_json::from_str(&line).context("Malformed batch request")?;
        let reply = match batch.execute() {
            Ok(results) => WorkerReply::done(batch.start, results),
            Err(e) => WorkerReply::failed(batch.start, format!("{e:#}")),
        };

        serde_json::to_writer(&mut output, &reply)?;
        output.write_all(b"\n")?;
        output.flush()?;
        served += 1;
    }

    tracing::debug!("Worker process served {} batches", served);
    Ok(served)
}

/// Parent side: forwards batches to one child process
pub struct ChildExecutor {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    line: String,
}

impl ChildExecutor {
    pub fn launch(program: &Path) -> Result<Self> {
        let mut child = Command::new(program)
            .arg(WORKER_SUBCOMMAND)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to launch worker process {}", program.display()))?;

        let stdin = child.stdin.take().context("Worker stdin was not captured")?;
        let stdout = child.stdout.take().context("Worker stdout was not captured")?;

        Ok(Self {
            child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
            line: String::new(),
        })
    }
}

impl BatchExecutor for ChildExecutor {
    fn execute(&mut self, batch: &Batch) -> Result<Vec<Checksum>> {
        serde_json::to_writer(&mut self.stdin, batch)?;
        self.stdin.write_all(b"\n")?;
        self.stdin
            .flush()
            .context("Worker process closed its input")?;

        self.line.clear();
        let read = self
            .stdout
            .read_line(&mut self.line)
            .context("Failed to read worker reply")?;
        if read == 0 {
            bail!("Worker process {} exited unexpectedly", self.child.id());
        }

        let reply: WorkerReply =
            serde_json::from_str(self.line.trim_end()).context("Malformed worker reply")?;
        reply.into_results(batch.start)
    }

    fn close(self) -> Result<()> {
        let Self {
            mut child, stdin, ..
        } = self;
        // EOF on stdin ends the child's serve loop
        drop(stdin);

        let status = child.wait().context("Failed to wait for worker process")?;
        if !status.success() {
            bail!("Worker process exited with {status}");
        }
        Ok(())
    }
}

/// Spawn a process-backed pool running `program worker` children
pub fn spawn(program: &Path, workers: usize) -> Result<ChannelPool> {
    ChannelPool::spawn(Backend::Process, workers, |_| ChildExecutor::launch(program))
}
