// ── Core error types ──
//
// User-facing errors from innkeep-core. Consumers never see raw HTTP
// plumbing; the `From<innkeep_api::Error>` impl translates transport-layer
// errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Credential errors ────────────────────────────────────────────
    #[error("Not authenticated -- run the authorization flow first")]
    NotAuthenticated,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to PMS at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("PMS request timed out")]
    Timeout,

    // ── Upstream errors ──────────────────────────────────────────────
    #[error("PMS API error: {message}")]
    Upstream {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid report period: {message}")]
    InvalidPeriod { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if re-running the authorization flow is the fix.
    pub fn needs_reauthorization(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::AuthenticationFailed { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<innkeep_api::Error> for CoreError {
    fn from(err: innkeep_api::Error) -> Self {
        use innkeep_api::Error as ApiError;

        match err {
            ApiError::NotAuthenticated => CoreError::NotAuthenticated,
            ApiError::AuthExchangeFailed { status, body } => CoreError::AuthenticationFailed {
                message: format!("authorization code rejected (HTTP {status}): {body}"),
            },
            ApiError::RefreshFailed { message } => CoreError::AuthenticationFailed {
                message: format!("token refresh failed: {message}"),
            },
            ApiError::UpstreamAuthFailed => CoreError::AuthenticationFailed {
                message: "PMS rejected the refreshed access token".into(),
            },
            ApiError::UpstreamRequestFailed { status, body } => CoreError::Upstream {
                message: format!("HTTP {status}: {body}"),
                status: Some(status),
            },
            ApiError::Api { message } => CoreError::Upstream {
                message,
                status: None,
            },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Upstream {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            ApiError::Tls(message) => CoreError::Config { message },
            ApiError::Deserialization { message, .. } => CoreError::Upstream {
                message: format!("unexpected response shape: {message}"),
                status: None,
            },
            ApiError::CredentialStore(message) => CoreError::Internal(message),
        }
    }
}
