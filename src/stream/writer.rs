//! Request writer.
//!
//! Serialises the [`Request`] to a single JSON document, writes it to the
//! tool's `stdin`, then closes the pipe so the tool sees end-of-input.
//! The request is never streamed incrementally.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::models::Request;
use crate::{AppError, Result};

/// Write `request` to `stdin` and close it.
///
/// Takes `stdin` by value: the pipe is dropped on return, on every path.
///
/// # Errors
///
/// - [`AppError::Protocol`]`("failed to serialise request: …")` if
///   serialization fails.
/// - [`AppError::Io`]`("write failed: …")` if the tool closed its stdin
///   early (for example because it already exited).
pub async fn write_request<W>(session_id: &str, mut stdin: W, request: &Request) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = request.to_json_bytes()?;
    bytes.push(b'\n');

    stdin
        .write_all(&bytes)
        .await
        .map_err(|e| AppError::Io(format!("write failed: {e}")))?;
    stdin
        .shutdown()
        .await
        .map_err(|e| AppError::Io(format!("close failed: {e}")))?;

    debug!(session_id, bytes = bytes.len(), "request written, stdin closed");
    Ok(())
}
