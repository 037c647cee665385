//! File-backed documents for the CLI.
//!
//! A file is read once into the editor; after an apply it is written back
//! atomically via `tempfile::NamedTempFile::persist()`. Before writing, the
//! SHA-256 of the file on disk is compared with the digest taken at load
//! time so edits made elsewhere in the meantime are not silently clobbered.

use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{AppError, Result};

/// A file read from disk, with the digest of its original bytes.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// Path the file was read from.
    pub path: PathBuf,
    /// Contents at load time.
    pub content: String,
    /// Hex SHA-256 of the contents at load time.
    pub original_hash: String,
}

/// Summary of a completed file write operation.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    /// Path of the written file.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes_written: usize,
}

/// Read `path` as UTF-8 text and record its digest.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be read or is not UTF-8.
pub fn load(path: &Path) -> Result<LoadedFile> {
    let bytes = std::fs::read(path)
        .map_err(|err| AppError::Io(format!("failed to read {}: {err}", path.display())))?;
    let original_hash = sha256_hex(&bytes);
    let content = String::from_utf8(bytes)
        .map_err(|err| AppError::Io(format!("{} is not valid utf-8: {err}", path.display())))?;

    Ok(LoadedFile {
        path: path.to_path_buf(),
        content,
        original_hash,
    })
}

/// Write `content` back over `file`.
///
/// Unless `force` is set, the write is refused when the file on disk no
/// longer matches the digest recorded by [`load`].
///
/// # Errors
///
/// - `AppError::ApplyPrecondition` if the file changed on disk or vanished.
/// - `AppError::Io` on temp-file creation, write, or rename failures.
pub fn save(file: &LoadedFile, content: &str, force: bool) -> Result<WriteSummary> {
    let current_hash = match std::fs::read(&file.path) {
        Ok(bytes) => sha256_hex(&bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::ApplyPrecondition(format!(
                "{} no longer exists",
                file.path.display()
            )));
        }
        Err(err) => {
            return Err(AppError::Io(format!(
                "failed to read {} for hash: {err}",
                file.path.display()
            )));
        }
    };

    let hash_matches = current_hash == file.original_hash;
    if !hash_matches {
        if !force {
            return Err(AppError::ApplyPrecondition(format!(
                "{} changed on disk since it was loaded",
                file.path.display()
            )));
        }
        warn!(
            path = %file.path.display(),
            original_hash = %file.original_hash,
            current_hash = %current_hash,
            "file changed on disk, overwriting because force is set"
        );
    }

    let parent = match file.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)
        .map_err(|err| AppError::Io(format!("failed to create temporary file: {err}")))?;

    let bytes = content.as_bytes();
    tmp.write_all(bytes)
        .map_err(|err| AppError::Io(format!("failed to write temporary file: {err}")))?;

    tmp.persist(&file.path).map_err(|err| {
        AppError::Io(format!(
            "failed to persist file to {}: {err}",
            file.path.display()
        ))
    })?;

    info!(path = %file.path.display(), bytes = bytes.len(), "file written");

    Ok(WriteSummary {
        path: file.path.clone(),
        bytes_written: bytes.len(),
    })
}

/// Language tag for `path`, derived from its extension.
#[must_use]
pub fn language_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("rs") => "rust",
        Some("py") => "python",
        Some("js" | "mjs" | "cjs") => "javascript",
        Some("ts" | "tsx") => "typescript",
        Some("go") => "go",
        Some("c" | "h") => "c",
        Some("cc" | "cpp" | "cxx" | "hpp") => "cpp",
        Some("java") => "java",
        Some("rb") => "ruby",
        Some("sh" | "bash") => "bash",
        Some("el") => "elisp",
        Some("toml") => "toml",
        Some("md") => "markdown",
        _ => "text",
    }
}

/// Compute SHA-256 hex digest of the given bytes.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
