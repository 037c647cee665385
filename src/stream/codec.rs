//! NDJSON frame codec for the tool's stdout.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a configurable maximum line
//! length and decodes every complete line into a [`Frame`].
//!
//! Lines that cannot be used are skipped inside the codec and never surface
//! as decoder errors:
//!
//! | Line                              | Handling                      |
//! |-----------------------------------|-------------------------------|
//! | empty / whitespace only           | skipped silently              |
//! | not JSON, or wrong shape          | skipped; logged at `WARN`     |
//! | longer than [`MAX_LINE_BYTES`]    | discarded; logged at `WARN`   |
//! | invalid UTF-8                     | skipped; logged at `WARN`     |
//! | JSON object with no known field   | skipped; logged at `DEBUG`    |
//!
//! Only I/O failures of the underlying reader are returned as errors, which
//! keeps one bad line from costing the rest of the response.
//!
//! At end of input, [`Decoder::decode_eof`] parses the unterminated tail as a
//! final frame.

use std::io::ErrorKind;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};
use tracing::{debug, warn};

use crate::models::Frame;
use crate::{AppError, Result};

/// Maximum line length accepted by the frame codec: 1 MiB.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Frame decoder for the tool's response stream.
///
/// # Examples
///
/// ```rust,ignore
/// use tokio_util::codec::FramedRead;
/// use editor_assist::stream::codec::FrameCodec;
///
/// let frames = FramedRead::new(child_stdout, FrameCodec::new());
/// ```
#[derive(Debug)]
pub struct FrameCodec {
    lines: LinesCodec,
    skipped: usize,
}

impl FrameCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_line_bytes(MAX_LINE_BYTES)
    }

    /// Create a codec with a custom per-line limit.
    #[must_use]
    pub fn with_max_line_bytes(max: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max),
            skipped: 0,
        }
    }

    /// Number of non-blank lines dropped so far.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Pull lines from `step` until one yields a frame or input runs out.
    fn next_frame<F>(&mut self, src: &mut BytesMut, mut step: F) -> Result<Option<Frame>>
    where
        F: FnMut(&mut LinesCodec, &mut BytesMut) -> std::result::Result<Option<String>, LinesCodecError>,
    {
        loop {
            match step(&mut self.lines, src) {
                Ok(Some(line)) => {
                    if let Some(frame) = self.parse_line(&line) {
                        return Ok(Some(frame));
                    }
                }
                Ok(None) => return Ok(None),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    self.skipped += 1;
                    warn!("frame codec: line too long, discarding");
                }
                Err(LinesCodecError::Io(err)) if err.kind() == ErrorKind::InvalidData => {
                    self.skipped += 1;
                    warn!(error = %err, "frame codec: line is not valid utf-8, skipping");
                }
                Err(LinesCodecError::Io(err)) => return Err(AppError::Io(err.to_string())),
            }
        }
    }

    fn parse_line(&mut self, line: &str) -> Option<Frame> {
        match Frame::parse(line) {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                if !line.trim().is_empty() {
                    debug!(raw_line = %line, "frame codec: no known field, skipping");
                }
                None
            }
            Err(err) => {
                self.skipped += 1;
                warn!(error = %err, raw_line = %line, "frame codec: parse error, skipping line");
                None
            }
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.next_frame(src, LinesCodec::decode)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.next_frame(src, LinesCodec::decode_eof)
    }
}

/// Push-style wrapper around [`FrameCodec`] for callers that receive text
/// chunks rather than an `AsyncRead`.
///
/// Holds the incomplete trailing line between calls to [`FrameParser::push`];
/// [`FrameParser::finish`] flushes it.
#[derive(Debug, Default)]
pub struct FrameParser {
    codec: FrameCodec,
    pending: BytesMut,
}

impl FrameParser {
    /// Create an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every frame it completes.
    ///
    /// # Errors
    ///
    /// Never fails for in-memory input; the signature mirrors the decoder.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Frame>> {
        self.pending.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(frame) = self.codec.decode(&mut self.pending)? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Parse whatever is left as the final frame(s) of the stream.
    ///
    /// # Errors
    ///
    /// Never fails for in-memory input; the signature mirrors the decoder.
    pub fn finish(&mut self) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.codec.decode_eof(&mut self.pending)? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Bytes of the incomplete trailing line currently held back.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of non-blank lines dropped so far.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.codec.skipped()
    }
}
