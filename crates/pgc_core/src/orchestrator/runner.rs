//! Process execution behind the orchestrator.
//!
//! [`ToolRunner`] is the seam between the state machine and the OS:
//! [`TokioRunner`] spawns real processes, tests script the exits.

use std::fmt;
use std::future::Future;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Notify;

use super::observer::ConversionObserver;
use super::types::OutputStream;

const READ_CHUNK: usize = 4096;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    /// Shell-like rendering for the log; arguments with spaces are quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    Exited(i32),
    /// Terminated by a signal without an exit code.
    Signalled,
    /// Killed because the run was cancelled.
    Cancelled,
}

impl ProcessExit {
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ProcessExit::Exited(code),
            None => ProcessExit::Signalled,
        }
    }

    /// Exit code as reported to callers; signals map to `-1`.
    pub fn code(&self) -> Option<i32> {
        match self {
            ProcessExit::Exited(code) => Some(*code),
            ProcessExit::Signalled => Some(-1),
            ProcessExit::Cancelled => None,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, ProcessExit::Exited(0))
    }
}

/// Cancellation handle shared between the orchestrator and its caller.
///
/// Cloning shares the flag. `cancel()` wakes any process wait in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the active run.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag at the start of a new run.
    pub(crate) fn reset(&self) {
        self.inner.flag.store(false, Ordering::SeqCst);
    }

    /// Resolves once `cancel()` has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Runs the external tool.
pub trait ToolRunner: Send + Sync {
    /// Run `<program> --version` within `timeout` and return the first line
    /// of its output.
    fn query_version(&self, program: &str, timeout: Duration)
        -> impl Future<Output = io::Result<String>> + Send;

    /// Run one command to completion, streaming its output to `observer`.
    /// Kills the process and returns [`ProcessExit::Cancelled`] when
    /// `cancel` fires first.
    fn run(
        &self,
        command: &CommandLine,
        observer: &dyn ConversionObserver,
        cancel: &CancelHandle,
    ) -> impl Future<Output = io::Result<ProcessExit>> + Send;
}

/// [`ToolRunner`] on `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioRunner;

impl ToolRunner for TokioRunner {
    async fn query_version(&self, program: &str, timeout: Duration) -> io::Result<String> {
        let output = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, output).await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no response to --version within {:?}", timeout),
            )
        })??;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "--version exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    async fn run(
        &self,
        command: &CommandLine,
        observer: &dyn ConversionObserver,
        cancel: &CancelHandle,
    ) -> io::Result<ProcessExit> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = pump(child.stdout.take(), OutputStream::Stdout, observer);
        let stderr = pump(child.stderr.take(), OutputStream::Stderr, observer);

        let wait = async {
            let exit: io::Result<ProcessExit> = tokio::select! {
                status = child.wait() => status.map(ProcessExit::from_status),
                _ = cancel.cancelled() => {
                    tracing::info!("Killing {}", command.program);
                    child.kill().await?;
                    Ok(ProcessExit::Cancelled)
                }
            };
            exit
        };

        let (exit, (), ()) = tokio::join!(wait, stdout, stderr);
        exit
    }
}

/// Forward a pipe to the observer chunk by chunk until EOF.
async fn pump<R>(reader: Option<R>, stream: OutputStream, observer: &dyn ConversionObserver)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };
    let mut buf = [0u8; READ_CHUNK];
    let mut decoder = Utf8Chunks::default();
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let text = decoder.push(&buf[..n]);
                if !text.is_empty() {
                    observer.on_output(stream, &text);
                }
            }
            Err(e) => {
                tracing::debug!("Stopped reading {:?}: {}", stream, e);
                break;
            }
        }
    }
    if let Some(rest) = decoder.finish() {
        observer.on_output(stream, &rest);
    }
}

/// Decodes a byte stream read in arbitrary chunks.
///
/// A multi-byte character split across two reads is held back until the
/// rest arrives. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Chunks {
    pending: Vec<u8>,
}

impl Utf8Chunks {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        let mut start = 0;

        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let end = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..end]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = end + len;
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            start = end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Whatever is still held back at EOF, decoded lossily.
    fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| String::from_utf8_lossy(&self.pending).into_owned())
    }
}
