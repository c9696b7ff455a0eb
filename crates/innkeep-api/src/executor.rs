// Authenticated request execution
//
// The only path to the PMS API. Attaches the bearer token, and on
// HTTP 401 refreshes once and replays the request once. A second 401
// means the credential is dead; it is surfaced, never retried again.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, body_preview};
use crate::oauth::TokenAuthority;

/// Refresh-and-replay attempts allowed per call after a 401.
pub const MAX_AUTH_RETRIES: u32 = 1;

/// Issues single authenticated calls against a base URL.
///
/// Knows nothing about pagination or envelopes; returns the decoded JSON
/// body of any 2xx response.
pub struct RequestExecutor {
    http: reqwest::Client,
    base_url: Url,
    authority: Arc<TokenAuthority>,
}

impl RequestExecutor {
    pub fn new(http: reqwest::Client, base_url: Url, authority: Arc<TokenAuthority>) -> Self {
        Self {
            http,
            base_url,
            authority,
        }
    }

    pub fn authority(&self) -> &Arc<TokenAuthority> {
        &self.authority
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{endpoint}`, tolerating slashes on either side.
    fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{endpoint}"))?)
    }

    /// Execute one call. GET and DELETE carry `params` as a query string,
    /// other methods as a form body.
    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Value, Error> {
        let url = self.endpoint_url(endpoint)?;
        let mut token = self.authority.access_token()?;
        let mut auth_retries = 0;

        loop {
            let resp = self.send(&method, url.clone(), params, &token).await?;
            let status = resp.status();

            if status == StatusCode::UNAUTHORIZED {
                if auth_retries >= MAX_AUTH_RETRIES {
                    warn!(%url, "still unauthorized after token refresh");
                    return Err(Error::UpstreamAuthFailed);
                }
                auth_retries += 1;
                warn!(%url, "access token rejected, refreshing");
                token = self.authority.refresh().await?;
                continue;
            }

            let body = resp.text().await?;
            if !status.is_success() {
                debug!(%url, status = status.as_u16(), "upstream request failed");
                return Err(Error::UpstreamRequestFailed {
                    status: status.as_u16(),
                    body: body_preview(&body),
                });
            }

            return serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (endpoint: {endpoint})"),
                body: body_preview(&body),
            });
        }
    }

    async fn send(
        &self,
        method: &Method,
        url: Url,
        params: &[(&str, String)],
        token: &SecretString,
    ) -> Result<reqwest::Response, Error> {
        debug!("{method} {url} params={params:?}");

        let builder = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json");

        let builder = if *method == Method::GET || *method == Method::DELETE {
            builder.query(params)
        } else {
            builder.form(params)
        };

        Ok(builder.send().await?)
    }
}
