//! Response frame decoded from one line of the tool's stdout.

use serde::Deserialize;

/// One decoded unit of the response stream.
///
/// Every downstream consumer matches on this enum; field-presence checks
/// happen once, in [`Frame::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A content delta to append to the answer.
    Content(String),
    /// Error text reported in-band by the tool.
    Error(String),
    /// The tool's explicit end-of-answer marker.
    Done,
}

/// Raw wire shape; all fields optional so presence can be inspected.
#[derive(Debug, Deserialize)]
struct WireFrame {
    content: Option<String>,
    error: Option<String>,
    done: Option<bool>,
}

impl Frame {
    /// Parse one complete line into a frame.
    ///
    /// Returns `Ok(None)` for blank lines and for well-formed objects that
    /// carry none of the known fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Protocol("malformed frame: …")` when the line is
    /// not a JSON object of the expected shape.
    pub fn parse(line: &str) -> crate::Result<Option<Self>> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let wire: WireFrame = serde_json::from_str(line)
            .map_err(|err| crate::AppError::Protocol(format!("malformed frame: {err}")))?;

        // An error field wins over content carried on the same line.
        Ok(match wire {
            WireFrame {
                error: Some(error), ..
            } => Some(Self::Error(error)),
            WireFrame {
                content: Some(content),
                ..
            } => Some(Self::Content(content)),
            WireFrame {
                done: Some(true), ..
            } => Some(Self::Done),
            WireFrame { .. } => None,
        })
    }
}
