//! Request dispatcher: the public entry point for tool requests.
//!
//! A [`Dispatcher`] keeps at most one live [`ProcessSession`]. Every call to
//! [`Dispatcher::send`] first kills whatever session process is still
//! running, then starts a new one bound to the caller's continuation. The old
//! session task only reaps what is already dead.
//!
//! # Delivery contract
//!
//! The continuation passed to `send` is invoked exactly once if the request
//! runs to completion (success, tool error, abnormal exit, missing
//! executable, spawn failure) and never if the request is superseded or
//! cancelled. A finished session claims its delivery under the same lock the
//! supersede step takes, so the two can never both win.
//!
//! Streamed deltas follow the same rule: a session forwards a delta only
//! while holding the slot lock and still owning the slot, so nothing from a
//! superseded or cancelled session reaches the display after the next
//! session has prepared it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ToolConfig;
use crate::models::{Message, Outcome, Request};
use crate::stream::accumulator::{DisplaySink, ResponseAccumulator};
use crate::stream::session::{ProcessHandle, ProcessSession};
use crate::stream::spawner::resolve_executable;
use crate::{AppError, Result};

/// Bookkeeping for the session currently allowed to deliver.
#[derive(Debug)]
struct LiveSession {
    id: String,
    cancel: CancellationToken,
    process: ProcessHandle,
}

impl LiveSession {
    /// Kill the process now and tell the session task to stop.
    fn terminate(self) {
        self.process.kill();
        self.cancel.cancel();
    }
}

/// Shared single-slot cell for the live session.
type LiveSlot = Arc<Mutex<Option<LiveSession>>>;

/// Starts tool sessions and enforces the one-live-session rule.
///
/// Cheap to clone; clones share the same live-session slot.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: Arc<ToolConfig>,
    runtime: Handle,
    live: LiveSlot,
}

impl Dispatcher {
    /// Create a dispatcher bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when called outside a tokio runtime.
    pub fn new(config: ToolConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|err| AppError::Config(format!("no tokio runtime available: {err}")))?;
        Ok(Self::with_runtime(config, runtime))
    }

    /// Create a dispatcher that spawns its sessions on `runtime`.
    #[must_use]
    pub fn with_runtime(config: ToolConfig, runtime: Handle) -> Self {
        Self {
            config: Arc::new(config),
            runtime,
            live: Arc::new(Mutex::new(None)),
        }
    }

    /// Tool configuration used for every session.
    #[must_use]
    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Runtime the sessions are spawned on.
    #[must_use]
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Whether a session is currently live.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        lock_slot(&self.live).is_some()
    }

    /// Cancel the live session, if any, without invoking its continuation.
    ///
    /// Returns `true` when a session was cancelled.
    pub fn cancel(&self) -> bool {
        let Some(session) = lock_slot(&self.live).take() else {
            return false;
        };
        info!(session_id = %session.id, "cancelling live session");
        session.terminate();
        true
    }

    /// Send `messages` to the tool and deliver the result to `on_done`.
    ///
    /// When `sink` is present the request is marked as streaming, the sink is
    /// prepared before the request is written, and every content delta is
    /// forwarded to it as it arrives.
    ///
    /// Any live session is killed first, so at most one tool process is alive
    /// once this returns. A missing executable or a spawn failure is reported
    /// through `on_done` before this call returns.
    pub fn send<F>(&self, messages: Vec<Message>, sink: Option<Box<dyn DisplaySink>>, on_done: F)
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let session_id = Uuid::new_v4().to_string();
        let mut slot = lock_slot(&self.live);

        if let Some(previous) = slot.take() {
            info!(
                session_id = %previous.id,
                superseded_by = %session_id,
                "superseding live session"
            );
            previous.terminate();
        }

        let program = match resolve_executable(&self.config) {
            Ok(program) => program,
            Err(err) => {
                drop(slot);
                warn!(session_id = %session_id, %err, "tool executable not resolvable");
                on_done(Outcome::Error(format!(
                    "cannot find executable `{}`",
                    self.config.executable
                )));
                return;
            }
        };

        let request = Request::new(messages, sink.is_some());
        let sink = sink.map(|inner| {
            Box::new(LiveSink {
                id: session_id.clone(),
                live: Arc::clone(&self.live),
                inner,
            }) as Box<dyn DisplaySink>
        });
        let mut accumulator = ResponseAccumulator::new(sink);
        accumulator.prepare_sink();

        let session = {
            let _guard = self.runtime.enter();
            ProcessSession::spawn(
                session_id.clone(),
                &self.config,
                &program,
                request,
                accumulator,
            )
        };
        let session = match session {
            Ok(session) => session,
            Err(err) => {
                drop(slot);
                warn!(session_id = %session_id, %err, "tool spawn failed");
                on_done(Outcome::Error(err.to_string()));
                return;
            }
        };

        let process = session.process();
        let cancel = CancellationToken::new();
        let live = Arc::clone(&self.live);
        let token = cancel.clone();
        let id = session_id.clone();
        let span = info_span!("assist_session", session_id = %session_id);

        self.runtime.spawn(
            async move {
                let Some(outcome) = session.run(token.clone()).await else {
                    debug!("session ended without delivery");
                    return;
                };

                if claim_delivery(&live, &id, &token) {
                    debug!(error = outcome.is_error(), "delivering outcome");
                    on_done(outcome);
                } else {
                    debug!("session superseded after finishing, outcome dropped");
                }
            }
            .instrument(span),
        );

        *slot = Some(LiveSession {
            id: session_id,
            cancel,
            process,
        });
    }
}

/// Display sink that forwards only while its session owns the live slot.
///
/// `send` prepares the sink while holding the slot lock, and the session is
/// installed before that lock is released, so early deltas wait for it.
struct LiveSink {
    id: String,
    live: LiveSlot,
    inner: Box<dyn DisplaySink>,
}

impl DisplaySink for LiveSink {
    fn prepare(&mut self) {
        self.inner.prepare();
    }

    fn append(&mut self, delta: &str) {
        let slot = lock_slot(&self.live);
        if matches!(slot.as_ref(), Some(session) if session.id == self.id) {
            self.inner.append(delta);
        } else {
            debug!(session_id = %self.id, "dropping delta from a session that is no longer live");
        }
    }
}

/// Take the slot if it still belongs to session `id`.
fn claim_delivery(live: &LiveSlot, id: &str, token: &CancellationToken) -> bool {
    let mut slot = lock_slot(live);
    let owned = matches!(slot.as_ref(), Some(session) if session.id == id);
    if owned && !token.is_cancelled() {
        slot.take();
        true
    } else {
        false
    }
}

/// The slot is a plain value cell, so a poisoned lock is still usable.
fn lock_slot(live: &LiveSlot) -> MutexGuard<'_, Option<LiveSession>> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}
