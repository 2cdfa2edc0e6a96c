//! Analyzer invocation: one child process per analysis request.
//!
//! The document text is written to the child's stdin from a separate task
//! while stdout is collected, so a large document cannot deadlock against a
//! full output pipe. The process is never killed on behalf of a newer
//! request; stale results are filtered by the publisher instead.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use catlint_types::{AnalyzerSettings, DEFAULT_TIMEOUT_SECS};
use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// Flags appended after the document path.
pub const LINT_ARGS: [&str; 2] = ["--lint", "--stdin"];

/// Maximum captured stdout (4 MiB).
const MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

/// A fully-specified analyzer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    input: String,
    timeout: Duration,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, input: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            input: input.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `<program> <documentPath> --lint --stdin`, or
    /// `<interpreter> <program> <documentPath> --lint --stdin` when an
    /// interpreter is configured.
    #[must_use]
    pub fn for_document(settings: &AnalyzerSettings, document_path: &Path, text: String) -> Self {
        let mut args = Vec::with_capacity(4);
        let program = match settings.interpreter() {
            Some(interpreter) => {
                args.push(settings.program().to_string());
                interpreter.to_string()
            }
            None => settings.program().to_string(),
        };
        args.push(document_path.display().to_string());
        args.extend(LINT_ARGS.iter().map(ToString::to_string));
        Self::new(program, args, text).with_timeout(settings.timeout())
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// What a finished analyzer process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    exit_code: Option<i32>,
    stdout: String,
}

impl RunOutput {
    #[must_use]
    pub fn new(exit_code: Option<i32>, stdout: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
        }
    }

    /// `None` when the process was terminated by a signal.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }
}

/// The analyzer could not be run to completion.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{program} not found: {source}")]
    NotFound {
        program: String,
        source: which::Error,
    },
    #[error("failed to spawn {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("I/O error talking to {program}: {source}")]
    Io { program: String, source: io::Error },
    #[error("output of {program} exceeded {limit} bytes")]
    OutputTooLarge { program: String, limit: usize },
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Something that can run an analyzer invocation.
///
/// The returned future owns everything it needs, so callers may spawn it.
pub trait Analyzer: Send + Sync {
    fn run(&self, invocation: Invocation) -> BoxFuture<'static, Result<RunOutput, RunError>>;
}

/// Runs the analyzer as a real child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Spawn, feed stdin, and collect stdout, bounded by the invocation's timeout.
    ///
    /// On timeout the child is dropped, and `kill_on_drop` terminates it.
    pub async fn execute(invocation: Invocation) -> Result<RunOutput, RunError> {
        let timeout = invocation.timeout;
        let program = invocation.program.clone();
        match tokio::time::timeout(timeout, run_to_completion(invocation)).await {
            Ok(result) => result,
            Err(_) => Err(RunError::TimedOut { program, timeout }),
        }
    }
}

impl Analyzer for ProcessRunner {
    fn run(&self, invocation: Invocation) -> BoxFuture<'static, Result<RunOutput, RunError>> {
        Box::pin(Self::execute(invocation))
    }
}

async fn run_to_completion(invocation: Invocation) -> Result<RunOutput, RunError> {
    let Invocation {
        program,
        args,
        input,
        ..
    } = invocation;

    let resolved = which::which(&program).map_err(|source| RunError::NotFound {
        program: program.clone(),
        source,
    })?;

    let mut child = Command::new(&resolved)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RunError::Spawn {
            program: program.clone(),
            source,
        })?;

    tracing::debug!(program = %program, pid = ?child.id(), "Analyzer spawned");

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();

    let writer_program = program.clone();
    let writer = tokio::spawn(async move {
        let Some(mut stdin) = stdin else { return };
        // An analyzer may exit without reading its input; that is its call.
        if let Err(e) = stdin.write_all(input.as_bytes()).await {
            tracing::debug!(program = %writer_program, "Failed to write analyzer stdin: {e}");
            return;
        }
        if let Err(e) = stdin.shutdown().await {
            tracing::debug!(program = %writer_program, "Failed to close analyzer stdin: {e}");
        }
    });

    let mut captured = Vec::new();
    if let Some(stdout) = stdout {
        let mut limited = stdout.take(MAX_OUTPUT_BYTES as u64 + 1);
        limited
            .read_to_end(&mut captured)
            .await
            .map_err(|source| RunError::Io {
                program: program.clone(),
                source,
            })?;
    }
    if captured.len() > MAX_OUTPUT_BYTES {
        return Err(RunError::OutputTooLarge {
            program,
            limit: MAX_OUTPUT_BYTES,
        });
    }

    let status = child.wait().await.map_err(|source| RunError::Io {
        program: program.clone(),
        source,
    })?;
    let _ = writer.await;

    Ok(RunOutput::new(
        status.code(),
        String::from_utf8_lossy(&captured).into_owned(),
    ))
}
