//! Terminal result of one session.

/// The single value delivered to a request's continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The request failed; the message is suitable for a status line.
    Error(String),
    /// The tool answered successfully.
    Content {
        /// Full accumulated answer.
        text: String,
        /// Whether deltas were already forwarded to a live display.
        streamed: bool,
    },
}

impl Outcome {
    /// Convenience constructor for [`Outcome::Content`].
    #[must_use]
    pub fn content(text: impl Into<String>, streamed: bool) -> Self {
        Self::Content {
            text: text.into(),
            streamed,
        }
    }

    /// Convenience constructor for [`Outcome::Error`].
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// `true` for [`Outcome::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
