//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// The external tool executable could not be resolved.
    ExecutableNotFound(String),
    /// The operating system refused to start the external tool.
    Spawn(String),
    /// Response stream framing failure.
    Protocol(String),
    /// The external tool reported an error or terminated abnormally.
    Process(String),
    /// An apply action was requested without a usable pending edit.
    ApplyPrecondition(String),
    /// The editor host rejected an operation.
    Editor(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::ExecutableNotFound(msg) => write!(f, "executable not found: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Process(msg) => write!(f, "process: {msg}"),
            Self::ApplyPrecondition(msg) => write!(f, "cannot apply: {msg}"),
            Self::Editor(msg) => write!(f, "editor: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
