//! External tool process spawner.
//!
//! Spawns one tool process per request with:
//! - `kill_on_drop(true)` so an abandoned process never outlives its session.
//! - `env_clear()` + an explicit allowlist so only provider credentials and
//!   the model selector reach the child, never the editor's whole environment.
//! - Piped stdin/stdout/stderr for the request, the frame stream, and
//!   diagnostics respectively.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::config::ToolConfig;
use crate::{AppError, Result};

// ── Environment allowlist ────────────────────────────────────────────────────

/// Process-level variables the tool needs to run at all.
pub const BASE_ENV_VARS: &[&str] = &[
    "PATH",
    "HOME",
    "LANG",
    // Windows-specific variables.
    "USERPROFILE",
    "SystemRoot",
    "TEMP",
    "TMP",
];

/// Provider API-key variables forwarded to the tool.
pub const PROVIDER_KEY_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GEMINI_API_KEY",
    "GOOGLE_API_KEY",
    "MISTRAL_API_KEY",
    "GROQ_API_KEY",
    "DEEPSEEK_API_KEY",
    "OPENROUTER_API_KEY",
];

/// Full list of variable names forwarded for `config`.
#[must_use]
pub fn forwarded_env_names(config: &ToolConfig) -> Vec<String> {
    let mut names: Vec<String> = BASE_ENV_VARS
        .iter()
        .chain(PROVIDER_KEY_VARS)
        .map(|&name| name.to_owned())
        .collect();
    names.push(config.model_env_var.clone());
    names.extend(config.forward_env.iter().cloned());
    names.sort();
    names.dedup();
    names
}

// ── Executable resolution ────────────────────────────────────────────────────

/// Resolve the configured executable to an absolute path.
///
/// Performs only a filesystem lookup; no process is started.
///
/// # Errors
///
/// Returns `AppError::ExecutableNotFound` naming the executable.
pub fn resolve_executable(config: &ToolConfig) -> Result<PathBuf> {
    which::which(&config.executable).map_err(|err| {
        debug!(executable = %config.executable, %err, "executable lookup failed");
        AppError::ExecutableNotFound(config.executable.clone())
    })
}

// ── Process handle ───────────────────────────────────────────────────────────

/// A running tool process with its three pipes detached from the handle.
#[derive(Debug)]
pub struct ToolProcess {
    /// Child handle; dropping it kills the process.
    pub child: Child,
    /// Request channel.
    pub stdin: ChildStdin,
    /// Frame stream.
    pub stdout: ChildStdout,
    /// Diagnostic text.
    pub stderr: ChildStderr,
}

// ── Spawner ──────────────────────────────────────────────────────────────────

/// Build the command line for one request.
#[must_use]
pub fn build_command(config: &ToolConfig, program: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(&config.args);

    if let Some(model) = &config.model {
        cmd.arg(&config.model_flag).arg(model);
    }

    // Strip inherited environment, then inject only the allowlist.
    cmd.env_clear();
    for key in forwarded_env_names(config) {
        if let Ok(val) = std::env::var(&key) {
            cmd.env(key, val);
        }
    }

    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Spawn the tool at `program` and detach its pipes.
///
/// # Errors
///
/// - `AppError::Spawn("failed to spawn tool: …")` on OS spawn failure.
/// - `AppError::Spawn("failed to capture tool …")` when a pipe was not created.
pub fn spawn_tool(config: &ToolConfig, program: &Path, session_id: &str) -> Result<ToolProcess> {
    let mut child = build_command(config, program)
        .spawn()
        .map_err(|err| AppError::Spawn(format!("failed to spawn tool: {err}")))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture tool stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture tool stdout".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture tool stderr".into()))?;

    info!(
        session_id,
        program = %program.display(),
        pid = child.id(),
        "tool process spawned"
    );

    Ok(ToolProcess {
        child,
        stdin,
        stdout,
        stderr,
    })
}
