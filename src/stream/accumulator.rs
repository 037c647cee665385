//! Folding of decoded frames into a session's answer.

use tracing::debug;

use crate::models::Frame;

/// Incremental output surface updated while a streaming request runs.
///
/// Implementations are invoked from the session's task, so they must be
/// `Send` and should return quickly. `append` runs under the dispatcher's
/// live-session lock and must not call back into the dispatcher.
pub trait DisplaySink: Send {
    /// Clear the surface and make it visible. Called once, before the
    /// request is written to the tool.
    fn prepare(&mut self);

    /// Append one content delta.
    fn append(&mut self, delta: &str);
}

/// Append-only accumulation of one session's content and error text.
///
/// Content forwarded to the sink is never retracted, even when the session
/// later resolves to an error.
pub struct ResponseAccumulator {
    content: String,
    error: String,
    sink: Option<Box<dyn DisplaySink>>,
    saw_done: bool,
}

impl ResponseAccumulator {
    /// Create an accumulator; deltas are forwarded when `sink` is present.
    #[must_use]
    pub fn new(sink: Option<Box<dyn DisplaySink>>) -> Self {
        Self {
            content: String::new(),
            error: String::new(),
            sink,
            saw_done: false,
        }
    }

    /// Whether content deltas are being forwarded to a live display.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.sink.is_some()
    }

    /// Prepare the live display, if any.
    pub fn prepare_sink(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.prepare();
        }
    }

    /// Fold one frame into the accumulated state.
    pub fn absorb(&mut self, frame: Frame) {
        match frame {
            Frame::Error(text) => self.error.push_str(&text),
            Frame::Content(delta) => {
                if let Some(sink) = self.sink.as_mut() {
                    sink.append(&delta);
                }
                self.content.push_str(&delta);
            }
            // The process exit ends the stream; the marker is informational.
            Frame::Done => {
                debug!("accumulator: done marker received");
                self.saw_done = true;
            }
        }
    }

    /// Append diagnostic text read from the tool's stderr.
    pub fn push_diagnostic(&mut self, text: &str) {
        self.error.push_str(text);
    }

    /// Content accumulated so far.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Error text accumulated so far.
    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Whether a `done` frame was seen.
    #[must_use]
    pub fn saw_done(&self) -> bool {
        self.saw_done
    }

    /// Consume the accumulator, returning `(content, error)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.content, self.error)
    }
}

impl std::fmt::Debug for ResponseAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseAccumulator")
            .field("content_len", &self.content.len())
            .field("error_len", &self.error.len())
            .field("streaming", &self.sink.is_some())
            .field("saw_done", &self.saw_done)
            .finish()
    }
}
