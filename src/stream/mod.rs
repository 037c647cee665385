//! Streaming subprocess protocol client.
//!
//! Each request runs in its own [`session::ProcessSession`]: the tool is
//! spawned, a single JSON request is written to its stdin, and the
//! newline-delimited JSON frames on its stdout are folded into one answer
//! while its stderr is collected separately.
//!
//! Submodules:
//! - `codec`: [`LinesCodec`](tokio_util::codec::LinesCodec)-based frame decoding.
//! - `accumulator`: folds frames into content/error text and feeds a live display.
//! - `spawner`: executable lookup, environment allowlist, process spawning.
//! - `writer`: one-shot request write followed by end-of-input.
//! - `session`: drives one exchange and resolves its [`Outcome`](crate::models::Outcome).

pub mod accumulator;
pub mod codec;
pub mod session;
pub mod spawner;
pub mod writer;

pub use accumulator::{DisplaySink, ResponseAccumulator};
pub use codec::{FrameCodec, FrameParser};
pub use session::{ProcessHandle, ProcessSession};
