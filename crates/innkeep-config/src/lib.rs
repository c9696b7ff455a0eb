//! Configuration for the innkeep CLI.
//!
//! One TOML file merged with `INNKEEP_`-prefixed environment variables,
//! client-secret resolution (env var, then keyring, then plaintext), and
//! translation to `innkeep_core::ServiceConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use innkeep_core::{
    DEFAULT_API_URL, DEFAULT_EXACT_SOURCES, DEFAULT_SOURCE_ALIASES, DetailOptions, FetchOptions,
    OAuthConfig, ServiceConfig, SourceMatcher, TlsMode,
};

const KEYRING_SERVICE: &str = "innkeep";
const KEYRING_SECRET_ENTRY: &str = "oauth/client-secret";
const ENV_PREFIX: &str = "INNKEEP_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no OAuth client secret configured")]
    MissingClientSecret,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Where the token pair lives. Defaults to `<data dir>/tokens.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,

    #[serde(default)]
    pub pms: PmsSection,

    #[serde(default)]
    pub oauth: OAuthSection,

    #[serde(default)]
    pub fetch: FetchSection,

    #[serde(default)]
    pub details: DetailSection,

    #[serde(default)]
    pub sources: SourcesSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PmsSection {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Restrict listings to one property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,

    /// Extra CA certificate (PEM) to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for PmsSection {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            property_id: None,
            ca_cert: None,
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OAuthSection {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub redirect_uri: String,

    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Space-separated scope list.
    #[serde(default = "default_scopes")]
    pub scopes: String,

    /// Client secret (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Environment variable name containing the client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_env: Option<String>,
}

impl Default for OAuthSection {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: String::new(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            scopes: default_scopes(),
            client_secret: None,
            client_secret_env: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FetchSection {
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_page_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            batch_size: default_page_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DetailSection {
    #[serde(default = "default_detail_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for DetailSection {
    fn default() -> Self {
        Self {
            batch_size: default_detail_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourcesSection {
    /// Source names accepted as-is (case-insensitive).
    #[serde(default = "default_exact_sources")]
    pub exact: Vec<String>,

    /// Fragments accepted anywhere in the source name.
    #[serde(default = "default_aliases")]
    pub aliases: Vec<String>,
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            exact: default_exact_sources(),
            aliases: default_aliases(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_authorize_url() -> String {
    format!("{DEFAULT_API_URL}/oauth")
}
fn default_token_url() -> String {
    format!("{DEFAULT_API_URL}/access_token")
}
fn default_scopes() -> String {
    "read:reservation read:room read:rate".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    100
}
fn default_page_batch_size() -> usize {
    5
}
fn default_detail_batch_size() -> usize {
    3
}
fn default_batch_delay_ms() -> u64 {
    1000
}
fn default_exact_sources() -> Vec<String> {
    DEFAULT_EXACT_SOURCES.iter().map(|s| (*s).to_owned()).collect()
}
fn default_aliases() -> Vec<String> {
    DEFAULT_SOURCE_ALIASES.iter().map(|s| (*s).to_owned()).collect()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "innkeep", "innkeep")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("innkeep");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the token pair is stored for `cfg`.
pub fn token_path(cfg: &Config) -> PathBuf {
    if let Some(ref path) = cfg.token_file {
        return path.clone();
    }
    project_dirs().map_or_else(
        || dirs_fallback().join("tokens.json"),
        |dirs| dirs.data_dir().join("tokens.json"),
    )
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load config from `path` (or the default location) plus environment.
///
/// A missing file is not an error; defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Client secret ───────────────────────────────────────────────────

/// Resolve the OAuth client secret: env var, then keyring, then plaintext.
pub fn resolve_client_secret(oauth: &OAuthSection) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = oauth.client_secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_SECRET_ENTRY) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref secret) = oauth.client_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::MissingClientSecret)
}

/// Store the client secret in the OS keyring.
pub fn store_client_secret(secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_SECRET_ENTRY)?.set_password(secret)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

fn require(field: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be set".into(),
        });
    }
    Ok(value.to_owned())
}

/// OAuth client settings, resolving the secret.
pub fn to_oauth_config(section: &OAuthSection) -> Result<OAuthConfig, ConfigError> {
    Ok(OAuthConfig {
        client_id: require("oauth.client_id", &section.client_id)?,
        redirect_uri: require("oauth.redirect_uri", &section.redirect_uri)?,
        authorize_url: parse_url("oauth.authorize_url", &section.authorize_url)?,
        token_url: parse_url("oauth.token_url", &section.token_url)?,
        scopes: section.scopes.split_whitespace().map(str::to_owned).collect(),
        client_secret: resolve_client_secret(section)?,
    })
}

/// Build the runtime `ServiceConfig`. `timeout` overrides `pms.timeout_secs`.
pub fn to_service_config(
    cfg: &Config,
    timeout: Option<Duration>,
) -> Result<ServiceConfig, ConfigError> {
    let api_url = parse_url("pms.api_url", &cfg.pms.api_url)?;
    if cfg.fetch.page_size == 0 {
        return Err(ConfigError::Validation {
            field: "fetch.page_size".into(),
            reason: "must be at least 1".into(),
        });
    }

    let tls = cfg
        .pms
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    Ok(ServiceConfig {
        api_url,
        property_id: cfg.pms.property_id.clone().filter(|id| !id.trim().is_empty()),
        oauth: to_oauth_config(&cfg.oauth)?,
        tls,
        timeout: timeout.unwrap_or(Duration::from_secs(cfg.pms.timeout_secs)),
        fetch: FetchOptions {
            page_size: cfg.fetch.page_size,
            batch_size: cfg.fetch.batch_size,
            inter_batch_delay: Duration::from_millis(cfg.fetch.batch_delay_ms),
        }
        .normalized(),
        details: DetailOptions {
            batch_size: cfg.details.batch_size,
            inter_batch_delay: Duration::from_millis(cfg.details.batch_delay_ms),
        }
        .normalized(),
        sources: SourceMatcher::new(&cfg.sources.exact, &cfg.sources.aliases),
    })
}
