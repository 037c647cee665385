//! One external-tool invocation bound to one request.
//!
//! A [`ProcessSession`] owns the pipes of its child process and the
//! [`ResponseAccumulator`] for its answer. Nothing else holds a reference to
//! that state: when a session is superseded its task simply stops, and any
//! output still in flight has nowhere to be folded into.
//!
//! # Lifecycle
//!
//! 1. [`ProcessSession::spawn`] starts the tool (synchronous, so the caller
//!    knows immediately whether a process exists).
//! 2. [`ProcessSession::run`] writes the request, reads stdout frames and
//!    stderr text concurrently, and waits for the process to exit.
//! 3. On exit the stderr reader is stopped, the unterminated stdout tail has
//!    already been parsed as a final frame, and exactly one [`Outcome`] is
//!    resolved.
//!
//! Cancellation stops the session at any point, kills and reaps the child,
//! and yields no outcome at all. The child is shared through a
//! [`ProcessHandle`] so a superseding caller can kill it immediately, without
//! waiting for the session task to be polled again.

use std::future::{poll_fn, Future};
use std::path::Path;
use std::pin::pin;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{BytesCodec, FramedRead};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ToolConfig;
use crate::models::{Outcome, Request};
use crate::stream::accumulator::ResponseAccumulator;
use crate::stream::codec::FrameCodec;
use crate::stream::spawner::{spawn_tool, ToolProcess};
use crate::stream::writer::write_request;
use crate::Result;

/// How long stderr may keep draining after the process has exited.
pub const DIAGNOSTIC_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Shared handle to a session's child process.
///
/// Only the session task reaps the child. Other holders can signal it, and
/// the shared lock keeps them from signalling a pid that was already reaped.
#[derive(Debug, Clone)]
pub struct ProcessHandle(Arc<Mutex<Child>>);

impl ProcessHandle {
    fn new(child: Child) -> Self {
        Self(Arc::new(Mutex::new(child)))
    }

    /// Send the kill signal without waiting for the process to exit.
    ///
    /// Does nothing once the process has been reaped.
    pub fn kill(&self) {
        if let Err(err) = self.lock().start_kill() {
            debug!(%err, "tool process already exited");
        }
    }

    /// Wait for exit and reap the child.
    ///
    /// The lock is held only for each synchronous poll, so `kill` never waits
    /// on a running process.
    async fn wait(&self) -> std::io::Result<ExitStatus> {
        poll_fn(|cx| {
            let mut child = self.lock();
            let mut wait = pin!(child.wait());
            wait.as_mut().poll(cx)
        })
        .await
    }

    fn lock(&self) -> MutexGuard<'_, Child> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A spawned tool process together with the state of its single exchange.
#[derive(Debug)]
pub struct ProcessSession {
    id: String,
    process: ProcessHandle,
    stdin: ChildStdin,
    stdout: ChildStdout,
    stderr: ChildStderr,
    request: Request,
    accumulator: ResponseAccumulator,
}

impl ProcessSession {
    /// Spawn the tool at `program` for `request`.
    ///
    /// The accumulator's sink, if any, should already be prepared: the
    /// request is written as soon as [`ProcessSession::run`] is polled.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` if the process could not be started.
    pub fn spawn(
        id: String,
        config: &ToolConfig,
        program: &Path,
        request: Request,
        accumulator: ResponseAccumulator,
    ) -> Result<Self> {
        let ToolProcess {
            child,
            stdin,
            stdout,
            stderr,
        } = spawn_tool(config, program, &id)?;
        Ok(Self {
            id,
            process: ProcessHandle::new(child),
            stdin,
            stdout,
            stderr,
            request,
            accumulator,
        })
    }

    /// Handle that can kill this session's process from another task.
    #[must_use]
    pub fn process(&self) -> ProcessHandle {
        self.process.clone()
    }

    /// Session identifier used in logs.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the exchange to completion.
    ///
    /// Returns `None` when `cancel` fires first; the child is killed and
    /// reaped before returning in that case.
    pub async fn run(self, cancel: CancellationToken) -> Option<Outcome> {
        let Self {
            id,
            process,
            stdin,
            stdout,
            stderr,
            request,
            mut accumulator,
        } = self;

        let (diagnostic_task, diagnostic_rx) = spawn_diagnostics(&id, stderr);

        let finished = {
            let exchange = drive(&id, &process, stdin, stdout, &request, &mut accumulator);
            tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                status = exchange => Some(status),
            }
        };

        let Some(status) = finished else {
            info!(session_id = %id, "session cancelled, killing tool process");
            diagnostic_task.abort();
            process.kill();
            if let Err(err) = process.wait().await {
                warn!(session_id = %id, %err, "failed to reap tool process");
            }
            return None;
        };

        let diagnostics = collect_diagnostics(&id, diagnostic_task, diagnostic_rx).await;
        accumulator.push_diagnostic(&diagnostics);

        let streamed = accumulator.is_streaming();
        let saw_done = accumulator.saw_done();
        let (content, error) = accumulator.into_parts();

        match &status {
            Ok(exit) => info!(session_id = %id, %exit, saw_done, "tool process exited"),
            Err(err) => warn!(session_id = %id, %err, "error waiting for tool process"),
        }

        Some(resolve_outcome(content, error, status, streamed))
    }
}

/// Pick the single outcome for a finished session.
///
/// Error text always wins; otherwise a successful exit yields the content
/// and any other exit yields a message naming how the process ended.
#[must_use]
pub fn resolve_outcome(
    content: String,
    error: String,
    status: std::io::Result<ExitStatus>,
    streamed: bool,
) -> Outcome {
    if !error.is_empty() {
        return Outcome::Error(error);
    }

    match status {
        Ok(exit) if exit.success() => Outcome::Content {
            text: content,
            streamed,
        },
        Ok(exit) => Outcome::Error(describe_exit(exit)),
        Err(err) => Outcome::Error(format!("failed to wait for tool process: {err}")),
    }
}

/// Human-readable description of an unsuccessful exit.
#[must_use]
pub fn describe_exit(exit: ExitStatus) -> String {
    if let Some(code) = exit.code() {
        return format!("tool process exited with code {code}");
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = exit.signal() {
            return format!("tool process terminated by signal {signal}");
        }
    }

    "tool process terminated by signal".to_owned()
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Write the request, read every stdout frame, then wait for exit.
async fn drive(
    id: &str,
    process: &ProcessHandle,
    stdin: ChildStdin,
    stdout: ChildStdout,
    request: &Request,
    accumulator: &mut ResponseAccumulator,
) -> std::io::Result<ExitStatus> {
    let write = async {
        if let Err(err) = write_request(id, stdin, request).await {
            // The exit status or stderr explains why; keep reading.
            warn!(session_id = id, error = %err, "request write failed");
        }
    };
    let read = read_frames(id, stdout, accumulator);

    tokio::join!(write, read);
    process.wait().await
}

/// Fold stdout frames into `accumulator` until end of input.
///
/// `FramedRead` calls `decode_eof` at end of input, so an unterminated last
/// line is still parsed.
async fn read_frames(id: &str, stdout: ChildStdout, accumulator: &mut ResponseAccumulator) {
    let mut frames = FramedRead::new(stdout, FrameCodec::new());

    while let Some(item) = frames.next().await {
        match item {
            Ok(frame) => {
                debug!(session_id = id, ?frame, "frame received");
                accumulator.absorb(frame);
            }
            Err(err) => {
                warn!(session_id = id, error = %err, "stdout read failed, stopping");
                break;
            }
        }
    }

    debug!(session_id = id, "stdout closed");
}

/// Forward raw stderr chunks through a channel owned by the session.
fn spawn_diagnostics(
    id: &str,
    stderr: ChildStderr,
) -> (JoinHandle<()>, mpsc::UnboundedReceiver<BytesMut>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = id.to_owned();

    let task = tokio::spawn(async move {
        let mut chunks = FramedRead::new(stderr, BytesCodec::new());
        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    if tx.send(chunk).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    debug!(session_id = %id, %err, "stderr read failed, stopping");
                    break;
                }
            }
        }
    });

    (task, rx)
}

/// Stop the stderr reader and return everything it captured.
async fn collect_diagnostics(
    id: &str,
    mut task: JoinHandle<()>,
    mut rx: mpsc::UnboundedReceiver<BytesMut>,
) -> String {
    if tokio::time::timeout(DIAGNOSTIC_DRAIN_GRACE, &mut task)
        .await
        .is_err()
    {
        debug!(session_id = id, "stderr still open after exit, stopping reader");
        task.abort();
    }

    let mut raw = Vec::new();
    while let Ok(chunk) = rx.try_recv() {
        raw.extend_from_slice(&chunk);
    }
    String::from_utf8_lossy(&raw).into_owned()
}
