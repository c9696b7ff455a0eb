// Credential persistence
//
// A single access/refresh token pair, durable across restarts. Stores
// never surface read failures: a missing or corrupt record loads as
// `None`, which callers treat as "authentication required".

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;

/// The live OAuth2 credential.
///
/// Only the `TokenAuthority` writes a new pair (on code exchange or
/// refresh). `saved_at` is stamped by the store at save time.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: SecretString,
    /// Some providers omit a refresh token on exchange; refresh then fails.
    pub refresh_token: Option<SecretString>,
    pub saved_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn new(access_token: SecretString, refresh_token: Option<SecretString>) -> Self {
        Self {
            access_token,
            refresh_token,
            saved_at: Utc::now(),
        }
    }

    fn stamped(mut self) -> Self {
        self.saved_at = Utc::now();
        self
    }
}

/// Storage for the single live `TokenPair`.
pub trait CredentialStore: Send + Sync {
    /// Durably overwrite the stored pair, stamping `saved_at`.
    /// Returns the pair as persisted.
    fn save(&self, pair: TokenPair) -> Result<TokenPair, Error>;

    /// Load the stored pair. Absent, unreadable and corrupt all map to `None`.
    fn load(&self) -> Option<TokenPair>;
}

/// On-disk shape of the token file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    saved_at: DateTime<Utc>,
}

impl From<&TokenPair> for StoredTokens {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.expose_secret().to_owned(),
            refresh_token: pair
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            saved_at: pair.saved_at,
        }
    }
}

impl From<StoredTokens> for TokenPair {
    fn from(stored: StoredTokens) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            refresh_token: stored
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            saved_at: stored.saved_at,
        }
    }
}

// ── File store ───────────────────────────────────────────────────────

/// JSON token file.
///
/// Writes land in a sibling temp file which is then renamed over the
/// target, so readers never observe a half-written record.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, contents: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp, &self.path)
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, pair: TokenPair) -> Result<TokenPair, Error> {
        let pair = pair.stamped();
        let json = serde_json::to_vec_pretty(&StoredTokens::from(&pair))
            .map_err(|e| Error::CredentialStore(format!("failed to encode tokens: {e}")))?;

        self.write_atomic(&json).map_err(|e| {
            Error::CredentialStore(format!("failed to write {}: {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), "token pair saved");
        Ok(pair)
    }

    fn load(&self) -> Option<TokenPair> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token file unreadable");
                return None;
            }
        };

        match serde_json::from_str::<StoredTokens>(&raw) {
            Ok(stored) if !stored.access_token.is_empty() => Some(stored.into()),
            Ok(_) => {
                warn!(path = %self.path.display(), "token file has an empty access token");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token file is corrupt");
                None
            }
        }
    }
}

// ── Memory store ─────────────────────────────────────────────────────

/// Process-local store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    pair: RwLock<Option<TokenPair>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pair already on file.
    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            pair: RwLock::new(Some(pair)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, pair: TokenPair) -> Result<TokenPair, Error> {
        let pair = pair.stamped();
        *self.pair.write().unwrap_or_else(PoisonError::into_inner) = Some(pair.clone());
        Ok(pair)
    }

    fn load(&self) -> Option<TokenPair> {
        self.pair
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
