//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use innkeep_config::ConfigError;
use innkeep_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the PMS at {url}")]
    #[diagnostic(
        code(innkeep::connection_failed),
        help(
            "Check network access and pms.api_url.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(innkeep::timeout),
        help("Increase the timeout with --timeout or pms.timeout_secs.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not authorized with the PMS yet")]
    #[diagnostic(
        code(innkeep::not_authenticated),
        help(
            "Open the URL from `innkeep auth url`, approve access, then run:\n\
             innkeep auth exchange <CODE>"
        )
    )]
    NotAuthenticated,

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(innkeep::auth_failed),
        help("The stored grant is no longer valid. Re-run `innkeep auth url` and `innkeep auth exchange`.")
    )]
    AuthFailed { message: String },

    #[error("No OAuth client secret configured")]
    #[diagnostic(
        code(innkeep::no_client_secret),
        help(
            "Store it with: innkeep config set-secret\n\
             Or set oauth.client_secret_env to the name of an environment variable."
        )
    )]
    NoClientSecret,

    // ── API ──────────────────────────────────────────────────────────
    #[error("PMS API error: {message}")]
    #[diagnostic(code(innkeep::api_error))]
    Api {
        status: Option<u16>,
        message: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(innkeep::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(innkeep::config),
        help("Inspect the effective settings with: innkeep config show")
    )]
    Config { message: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(innkeep::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(innkeep::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(innkeep::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(innkeep::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotAuthenticated | Self::AuthFailed { .. } | Self::NoClientSecret => {
                exit_code::AUTH
            }
            Self::Validation { .. } | Self::ConfigExists { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthenticated => CliError::NotAuthenticated,
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Upstream { message, status } => CliError::Api { status, message },
            CoreError::InvalidPeriod { message } => CliError::Validation {
                field: "period".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::MissingClientSecret => CliError::NoClientSecret,
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
