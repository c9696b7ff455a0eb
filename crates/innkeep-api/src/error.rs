use thiserror::Error;

/// Top-level error type for the `innkeep-api` crate.
///
/// Covers every failure mode of the credential lifecycle and the PMS
/// request path. `innkeep-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Credentials ─────────────────────────────────────────────────
    /// No token pair on file. The authorization hand-off must run first.
    #[error("Not authenticated -- no stored credentials, run the authorization flow first")]
    NotAuthenticated,

    /// The token endpoint rejected an authorization-code exchange.
    #[error("Authorization code exchange failed (HTTP {status}): {body}")]
    AuthExchangeFailed { status: u16, body: String },

    /// No refresh token on file, or the token endpoint rejected it.
    #[error("Token refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The credential store could not persist a token pair.
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    // ── Upstream ────────────────────────────────────────────────────
    /// Still HTTP 401 after one refresh-and-retry. The credential is
    /// presumed invalid and no further retry is attempted.
    #[error("Upstream rejected credentials after token refresh")]
    UpstreamAuthFailed,

    /// Any other non-2xx response from the PMS API.
    #[error("Upstream request failed (HTTP {status}): {body}")]
    UpstreamRequestFailed { status: u16, body: String },

    /// HTTP 200 whose envelope reports `success: false`.
    #[error("PMS API error: {message}")]
    Api { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the failure can only be resolved by
    /// re-running the authorization flow.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated
                | Self::AuthExchangeFailed { .. }
                | Self::RefreshFailed { .. }
                | Self::UpstreamAuthFailed
        )
    }

    /// Returns `true` if this is a transient error worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::UpstreamRequestFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The upstream HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthExchangeFailed { status, .. } | Self::UpstreamRequestFailed { status, .. } => {
                Some(*status)
            }
            Self::UpstreamAuthFailed => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Trim a response body to a loggable preview.
pub(crate) fn body_preview(body: &str) -> String {
    let end = body
        .char_indices()
        .nth(500)
        .map_or(body.len(), |(idx, _)| idx);
    body[..end].to_owned()
}
