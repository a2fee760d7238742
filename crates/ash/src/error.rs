//! Error types for the binary.
//!
//! `CliError` covers startup failures and carries miette help text and a
//! process exit code. `ShellError` covers a single command at the prompt:
//! it is rendered and the session carries on.

use miette::Diagnostic;
use thiserror::Error;

use ash_config::ConfigError;
use ash_core::CoreError;

use crate::shell::prompt::PromptError;

/// Process exit codes for startup failures.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const AUTH: i32 = 4;
    pub const CACHE: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("No platform configured")]
    #[diagnostic(
        code(ash::no_config),
        help("Create {path} or pass --url. For example:\n\n{example}")
    )]
    NoConfig { path: String, example: &'static str },

    #[error("Could not load configuration")]
    #[diagnostic(code(ash::config), help("{message}"))]
    ConfigLoad { message: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ash::validation))]
    Validation { field: String, reason: String },

    #[error("No API token configured for {host}")]
    #[diagnostic(
        code(ash::no_credentials),
        help(
            "Pass --token, set token_env or token in the config file,\n\
             or store the token in the system keyring under ash/{host}."
        )
    )]
    NoCredentials { host: String },

    // ── Startup ──────────────────────────────────────────────────────
    #[error("Cannot open the cache at {path}")]
    #[diagnostic(
        code(ash::cache),
        help("Remove the file to start with an empty cache.")
    )]
    Cache {
        path: String,
        #[source]
        source: CoreError,
    },

    #[error("Command '{name}' is declared but has no handler")]
    #[diagnostic(code(ash::registry))]
    UnregisteredCommand { name: String },

    #[error(transparent)]
    #[diagnostic(code(ash::platform))]
    Core(#[from] CoreError),

    #[error(transparent)]
    #[diagnostic(code(ash::shell))]
    Shell(#[from] ShellError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConfig { .. } | Self::ConfigLoad { .. } => exit_code::CONFIG,
            Self::Validation { .. } => exit_code::USAGE,
            Self::NoCredentials { .. }
            | Self::Core(CoreError::AuthenticationFailed { .. }) => exit_code::AUTH,
            Self::Cache { .. } => exit_code::CACHE,
            Self::UnregisteredCommand { .. } | Self::Core(_) | Self::Shell(_) => {
                exit_code::GENERAL
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingBaseUrl { path } => Self::NoConfig {
                path: path.display().to_string(),
                example: ash_config::CONFIG_EXAMPLE,
            },
            ConfigError::NoCredentials { host } => Self::NoCredentials { host },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Figment(e) => Self::ConfigLoad {
                message: e.to_string(),
            },
        }
    }
}

// ── Per-command errors ──────────────────────────────────────────────

/// Failure of one shell command. Never ends the session on its own.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("usage: {0}")]
    Usage(String),

    #[error("interrupted")]
    Interrupted,

    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError {
    pub fn usage(text: impl Into<String>) -> Self {
        Self::Usage(text.into())
    }
}

impl From<PromptError> for ShellError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Interrupted => Self::Interrupted,
            PromptError::Io(e) => Self::Io(e),
        }
    }
}
