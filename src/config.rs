//! Global configuration parsing and validation.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{AppError, Result};

/// How to launch the external AI tool.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ToolConfig {
    /// Executable name (looked up on `PATH`) or path.
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Arguments selecting the stdio transport mode.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Model or provider name; appended as `<model_flag> <model>` when set.
    #[serde(default)]
    pub model: Option<String>,
    /// Flag used to pass `model`.
    #[serde(default = "default_model_flag")]
    pub model_flag: String,
    /// Model-selector variable forwarded from the editor's environment.
    #[serde(default = "default_model_env_var")]
    pub model_env_var: String,
    /// Additional environment variable names forwarded to the tool.
    #[serde(default)]
    pub forward_env: Vec<String>,
}

fn default_executable() -> String {
    "ai-cli".into()
}

fn default_args() -> Vec<String> {
    vec!["--stdio".into()]
}

fn default_model_flag() -> String {
    "--model".into()
}

fn default_model_env_var() -> String {
    "AI_MODEL".into()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            args: default_args(),
            model: None,
            model_flag: default_model_flag(),
            model_env_var: default_model_env_var(),
            forward_env: Vec::new(),
        }
    }
}

/// Presentation preferences for the editor commands.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DisplayConfig {
    /// Stream `ask` and `explain` answers into the panel as they arrive.
    #[serde(default = "default_true")]
    pub stream_explanations: bool,
    /// Instruction line appended under a refactor proposal.
    #[serde(default = "default_apply_hint")]
    pub apply_hint: String,
}

fn default_true() -> bool {
    true
}

fn default_apply_hint() -> String {
    "Run the apply command to replace the selected code with this proposal.".into()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            stream_explanations: true,
            apply_hint: default_apply_hint(),
        }
    }
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// External tool invocation.
    #[serde(default)]
    pub tool: ToolConfig,
    /// Panel and apply presentation.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.tool.executable.trim().is_empty() {
            return Err(AppError::Config("tool.executable must not be empty".into()));
        }

        if self.tool.model.is_some() && self.tool.model_flag.trim().is_empty() {
            return Err(AppError::Config(
                "tool.model_flag must not be empty when tool.model is set".into(),
            ));
        }

        let names = std::iter::once(&self.tool.model_env_var).chain(&self.tool.forward_env);
        for name in names {
            if !is_valid_env_name(name) {
                return Err(AppError::Config(format!(
                    "invalid environment variable name: {name:?}"
                )));
            }
        }

        Ok(())
    }
}

fn is_valid_env_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains('\0')
}
