//! Editor commands built on the dispatcher and the edit reconciler.
//!
//! An [`Assistant`] owns the host editor handle, the [`Dispatcher`], and the
//! [`PendingSlot`]. Each command captures what it needs from the host,
//! releases the host lock, and hands a continuation to the dispatcher. The
//! continuation runs on the blocking pool because host callbacks such as
//! [`EditorHost::confirm`] may wait on the user.
//!
//! | Command                | Display            | Result handling       |
//! |------------------------|--------------------|-----------------------|
//! | `ask`                  | streamed (config)  | panel                 |
//! | `explain_selection`    | streamed (config)  | panel                 |
//! | `refactor_selection`   | none               | review-then-apply     |
//! | `fix_selection`        | none               | confirm-then-apply    |

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

use crate::config::DisplayConfig;
use crate::dispatcher::Dispatcher;
use crate::editor::{EditorHost, Selection, TrackedRegion};
use crate::models::{Message, Outcome};
use crate::prompts;
use crate::reconcile::{self, PendingSlot};
use crate::stream::accumulator::DisplaySink;
use crate::{AppError, Result};

/// Shared, lockable host editor.
pub type SharedHost<H> = Arc<Mutex<H>>;

fn lock_host<H>(host: &SharedHost<H>) -> MutexGuard<'_, H> {
    host.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Ticket ────────────────────────────────────────────────────────────────────

/// Completion handle for one command.
///
/// Resolves after the command's result has been reconciled with the editor.
#[derive(Debug)]
pub struct RequestTicket(oneshot::Receiver<Outcome>);

impl RequestTicket {
    /// Wait for the outcome; `None` means the request was superseded or
    /// cancelled.
    pub async fn wait(self) -> Option<Outcome> {
        self.0.await.ok()
    }
}

// ── Panel sink ────────────────────────────────────────────────────────────────

/// Live display that streams deltas into the host's panel.
struct PanelSink<H> {
    host: SharedHost<H>,
}

impl<H: EditorHost + Send> DisplaySink for PanelSink<H> {
    fn prepare(&mut self) {
        lock_host(&self.host).show_panel("");
    }

    fn append(&mut self, delta: &str) {
        lock_host(&self.host).append_to_panel(delta);
    }
}

// ── Region guard ──────────────────────────────────────────────────────────────

/// Releases a captured region if the continuation never consumes it
/// (for example because the request was superseded).
struct RegionGuard<H: EditorHost> {
    host: SharedHost<H>,
    region: Option<TrackedRegion>,
}

impl<H: EditorHost> RegionGuard<H> {
    /// Hand the region over without touching the host lock.
    fn take(mut self) -> Option<TrackedRegion> {
        self.region.take()
    }
}

impl<H: EditorHost> Drop for RegionGuard<H> {
    fn drop(&mut self) {
        if let Some(region) = self.region.take() {
            debug!("releasing unconsumed region");
            lock_host(&self.host).release_region(region);
        }
    }
}

// ── Assistant ─────────────────────────────────────────────────────────────────

/// Editor commands backed by the external tool.
pub struct Assistant<H: EditorHost> {
    host: SharedHost<H>,
    dispatcher: Dispatcher,
    pending: PendingSlot,
    display: DisplayConfig,
}

impl<H> Assistant<H>
where
    H: EditorHost + Send + 'static,
{
    /// Build an assistant around `host`.
    pub fn new(host: SharedHost<H>, dispatcher: Dispatcher, display: DisplayConfig) -> Self {
        Self {
            host,
            dispatcher,
            pending: PendingSlot::new(),
            display,
        }
    }

    /// Host editor handle.
    pub fn host(&self) -> &SharedHost<H> {
        &self.host
    }

    /// Pending Apply Slot shared by review-then-apply commands.
    pub fn pending(&self) -> &PendingSlot {
        &self.pending
    }

    /// Underlying dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Cancel the in-flight request, if any.
    pub fn cancel(&self) -> bool {
        self.dispatcher.cancel()
    }

    /// Ask a free-form question; the answer goes to the panel.
    pub fn ask(&self, question: &str) -> RequestTicket {
        self.send_to_panel(prompts::ask(question))
    }

    /// Explain the selected code; the answer goes to the panel.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Editor` when nothing is selected.
    pub fn explain_selection(&self) -> Result<RequestTicket> {
        let (selection, language) = self.capture_selection()?;
        let messages = prompts::explain(
            &language,
            &selection.text,
            selection.first_line,
            selection.last_line,
        );
        // Explanations never edit the buffer.
        lock_host(&self.host).release_region(selection.region);
        Ok(self.send_to_panel(messages))
    }

    /// Ask for a rewrite of the selection and park it for review.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Editor` when nothing is selected.
    pub fn refactor_selection(&self, instruction: &str) -> Result<RequestTicket> {
        let (selection, language) = self.capture_selection()?;
        let messages = prompts::refactor(&language, &selection.text, instruction);
        let original = selection.text;
        let guard = self.guard(selection.region);
        let slot = self.pending.clone();
        let hint = self.display.apply_hint.clone();

        Ok(self.send_with(messages, false, move |host, outcome| {
            let Some(region) = guard.take() else { return };
            match outcome {
                Outcome::Content { text, .. } => {
                    reconcile::review_then_apply(host, &slot, text, &original, region, &hint);
                }
                Outcome::Error(_) => host.release_region(region),
            }
        }))
    }

    /// Ask for a bug fix of the selection and apply it after confirmation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Editor` when nothing is selected.
    pub fn fix_selection(&self, description: Option<&str>) -> Result<RequestTicket> {
        let (selection, language) = self.capture_selection()?;
        let messages = prompts::fix(&language, &selection.text, description);
        let original = selection.text;
        let guard = self.guard(selection.region);

        Ok(self.send_with(messages, false, move |host, outcome| {
            let Some(region) = guard.take() else { return };
            match outcome {
                Outcome::Content { text, .. } => {
                    match reconcile::confirm_then_apply(host, text, &original, region) {
                        Ok(true) => host.message("Fix applied."),
                        Ok(false) => {}
                        Err(err) => host.message(&err.to_string()),
                    }
                }
                Outcome::Error(_) => host.release_region(region),
            }
        }))
    }

    /// Apply the edit parked by the last refactor.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ApplyPrecondition` when nothing is pending or the
    /// original document is gone; the error is also shown as a status message.
    pub fn apply_pending(&self) -> Result<()> {
        let mut host = lock_host(&self.host);
        match reconcile::apply_pending(&mut *host, &self.pending) {
            Ok(()) => {
                host.message("Changes applied.");
                Ok(())
            }
            Err(err) => {
                host.message(&err.to_string());
                Err(err)
            }
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn capture_selection(&self) -> Result<(Selection, String)> {
        let mut host = lock_host(&self.host);
        let selection = host
            .selected_range()
            .ok_or_else(|| AppError::Editor("no active selection".into()))?;
        Ok((selection, host.language_tag()))
    }

    fn guard(&self, region: TrackedRegion) -> RegionGuard<H> {
        RegionGuard {
            host: Arc::clone(&self.host),
            region: Some(region),
        }
    }

    fn send_to_panel(&self, messages: Vec<Message>) -> RequestTicket {
        let stream = self.display.stream_explanations;
        self.send_with(messages, stream, |host, outcome| match outcome {
            Outcome::Content {
                text,
                streamed: false,
            } => host.show_panel(text),
            Outcome::Content {
                text,
                streamed: true,
            } => {
                if !text.ends_with('\n') {
                    host.append_to_panel("\n");
                }
            }
            Outcome::Error(_) => {}
        })
    }

    /// Dispatch `messages`; on completion, report errors as a status message
    /// and run `handle` with the host locked.
    fn send_with<F>(&self, messages: Vec<Message>, stream: bool, handle: F) -> RequestTicket
    where
        F: FnOnce(&mut H, &Outcome) + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let host = Arc::clone(&self.host);
        let runtime = self.dispatcher.runtime().clone();

        let sink: Option<Box<dyn DisplaySink>> = stream.then(|| {
            Box::new(PanelSink {
                host: Arc::clone(&self.host),
            }) as Box<dyn DisplaySink>
        });

        self.dispatcher.send(messages, sink, move |outcome| {
            runtime.spawn_blocking(move || {
                {
                    let mut host = lock_host(&host);
                    if let Outcome::Error(message) = &outcome {
                        host.message(&format!("editor-assist: {}", message.trim()));
                    }
                    handle(&mut *host, &outcome);
                }
                if tx.send(outcome).is_err() {
                    debug!("request ticket dropped before completion");
                }
            });
        });

        RequestTicket(rx)
    }
}
