// ── Runtime pipeline configuration ──
//
// These types describe *how* to reach the PMS and how hard to push it.
// They carry credential data and throttling tuning, but never touch disk.
// The CLI constructs a `ServiceConfig` and hands it in.

use std::time::Duration;

use url::Url;

use innkeep_api::{OAuthConfig, TlsMode};

use crate::matcher::SourceMatcher;

/// Upper bound on concurrent page requests per batch.
pub const MAX_PAGE_BATCH_SIZE: usize = 10;

/// Throttling for the paginated reservation-list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Records per page (`limit` on the wire).
    pub page_size: u32,
    /// Pages requested concurrently per batch.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub inter_batch_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            batch_size: 5,
            inter_batch_delay: Duration::from_secs(1),
        }
    }
}

impl FetchOptions {
    /// Clamp to sane bounds: page size at least 1, batch size 1..=10.
    pub fn normalized(self) -> Self {
        Self {
            page_size: self.page_size.max(1),
            batch_size: self.batch_size.clamp(1, MAX_PAGE_BATCH_SIZE),
            inter_batch_delay: self.inter_batch_delay,
        }
    }
}

/// Throttling for per-reservation detail calls. Detail calls are heavier
/// than list pages, so batches are smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailOptions {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl Default for DetailOptions {
    fn default() -> Self {
        Self {
            batch_size: 3,
            inter_batch_delay: Duration::from_secs(1),
        }
    }
}

impl DetailOptions {
    pub fn normalized(self) -> Self {
        Self {
            batch_size: self.batch_size.max(1),
            inter_batch_delay: self.inter_batch_delay,
        }
    }
}

/// Everything `Reporter` needs to run against one PMS account.
///
/// Built by the CLI, passed to `Reporter` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// PMS API base URL (e.g. `https://hotels.cloudbeds.com/api/v1.1`).
    pub api_url: Url,
    /// Restrict listings to one property, if set.
    pub property_id: Option<String>,
    pub oauth: OAuthConfig,
    pub tls: TlsMode,
    /// Per-request timeout; the only bound on a hung remote call.
    pub timeout: Duration,
    pub fetch: FetchOptions,
    pub details: DetailOptions,
    pub sources: SourceMatcher,
}
