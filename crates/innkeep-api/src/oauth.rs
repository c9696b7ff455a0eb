// OAuth2 token authority
//
// Authorization-URL construction, authorization-code exchange and
// refresh-token grants against the PMS token endpoint. Every successful
// grant is persisted through the `CredentialStore` before it is returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{CredentialStore, TokenPair};
use crate::error::{Error, body_preview};
use crate::transport::TransportConfig;

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &[&str] = &["read:reservation", "read:room", "read:rate"];

/// Client registration and endpoints for the authorization server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    pub authorize_url: Url,
    pub token_url: Url,
    pub scopes: Vec<String>,
}

/// Token endpoint response. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// What is currently on file, without exposing the secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialStatus {
    pub saved_at: DateTime<Utc>,
    pub has_refresh_token: bool,
}

/// Owns the credential lifecycle for a single client registration.
///
/// Refreshes are serialized behind an async mutex: concurrent callers each
/// send their own refresh grant, one after another, and each re-reads the
/// stored refresh token once it holds the lock. Grants are never coalesced.
pub struct TokenAuthority {
    http: reqwest::Client,
    config: OAuthConfig,
    store: Arc<dyn CredentialStore>,
    refresh_lock: Mutex<()>,
}

impl TokenAuthority {
    pub fn new(
        config: OAuthConfig,
        store: Arc<dyn CredentialStore>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self::with_client(transport.build_client()?, config, store))
    }

    /// Use a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        config: OAuthConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            config,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// The URL the operator opens in a browser to grant access.
    pub fn build_authorization_url(&self) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "));
        url
    }

    /// Trade an authorization code for a token pair and persist it.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenPair, Error> {
        let code = code.trim();
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        debug!(url = %self.config.token_url, "exchanging authorization code");
        let resp = self
            .http
            .post(self.config.token_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "authorization code exchange rejected");
            return Err(Error::AuthExchangeFailed {
                status: status.as_u16(),
                body: body_preview(&body),
            });
        }

        let grant = parse_grant(&body)?;
        let pair = self.store.save(TokenPair::new(
            SecretString::from(grant.access_token),
            grant.refresh_token.map(SecretString::from),
        ))?;

        info!(expires_in = ?grant.expires_in, "authorization code exchanged, tokens saved");
        Ok(pair)
    }

    /// The stored access token. Expiry is not checked here; the PMS API
    /// answers 401 when it has lapsed.
    pub fn access_token(&self) -> Result<SecretString, Error> {
        self.store
            .load()
            .map(|pair| pair.access_token)
            .ok_or(Error::NotAuthenticated)
    }

    /// Run a refresh-token grant, persist the new pair, return the new access token.
    pub async fn refresh(&self) -> Result<SecretString, Error> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.store.load().ok_or_else(|| Error::RefreshFailed {
            message: "no stored credentials".into(),
        })?;
        let refresh_token = current.refresh_token.ok_or_else(|| Error::RefreshFailed {
            message: "no refresh token on file".into(),
        })?;

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
        ];

        debug!(url = %self.config.token_url, "refreshing access token");
        let resp = self
            .http
            .post(self.config.token_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "refresh grant rejected");
            return Err(Error::RefreshFailed {
                message: format!("HTTP {status}: {}", body_preview(&body)),
            });
        }

        let grant = parse_grant(&body).map_err(|e| Error::RefreshFailed {
            message: e.to_string(),
        })?;

        // Providers that do not rotate refresh tokens omit the field.
        let next_refresh = grant
            .refresh_token
            .map(SecretString::from)
            .or(Some(refresh_token));
        let pair = self
            .store
            .save(TokenPair::new(SecretString::from(grant.access_token), next_refresh))?;

        info!("access token refreshed");
        Ok(pair.access_token)
    }

    /// Whether a credential is on file, and when it was saved.
    pub fn status(&self) -> Option<CredentialStatus> {
        self.store.load().map(|pair| CredentialStatus {
            saved_at: pair.saved_at,
            has_refresh_token: pair.refresh_token.is_some(),
        })
    }
}

fn parse_grant(body: &str) -> Result<TokenResponse, Error> {
    let grant: TokenResponse = serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("invalid token response: {e}"),
        body: body_preview(body),
    })?;
    if grant.access_token.trim().is_empty() {
        return Err(Error::Deserialization {
            message: "token response has an empty access_token".into(),
            body: body_preview(body),
        });
    }
    Ok(grant)
}
