//! Reservation ingestion and commission reporting on top of `innkeep-api`.
//!
//! This crate owns the pipeline that turns a date window into a
//! commission report:
//!
//! - **[`PaginatedBatchFetcher`]**: Reads page 1 to learn the total, then
//!   fetches the remaining pages in sequential batches of concurrent
//!   requests with a fixed pause between batches. A failed page after the
//!   first is logged and skipped; a failed first page aborts the run.
//!
//! - **[`CommissionAggregator`]**: Keeps reservations whose source passes
//!   the [`SourceMatcher`], fetches their financial detail in smaller
//!   batches, and builds a [`MonthlyReport`] at [`COMMISSION_RATE`].
//!
//! - **[`ProgressChannel`]**: Broadcast handle carrying human-readable
//!   progress lines to any number of observers.
//!
//! - **[`Reporter`]**: Facade wiring credential store, token authority and
//!   PMS client together for one account. Entry point for the CLI.
//!
//! - **[`ReportPeriod`]**: Month, previous month, previous ISO week or an
//!   arbitrary range, resolved to dates against a caller-supplied "today".

pub mod config;
pub mod error;
pub mod fetch;
pub mod matcher;
pub mod model;
pub mod period;
pub mod progress;
pub mod report;
pub mod service;
pub mod source;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DetailOptions, FetchOptions, MAX_PAGE_BATCH_SIZE, ServiceConfig};
pub use error::CoreError;
pub use fetch::{FetchOutcome, MAX_PAGES, PaginatedBatchFetcher, page_count, plan_batches};
pub use matcher::{DEFAULT_EXACT_SOURCES, DEFAULT_SOURCE_ALIASES, SourceMatcher, SourceRule};
pub use model::{COMMISSION_RATE, MonthlyReport, ReportItem, ReservationListing, SkippedWork};
pub use period::{ReportPeriod, ResolvedPeriod, month_range};
pub use progress::ProgressChannel;
pub use report::CommissionAggregator;
pub use service::Reporter;
pub use source::ReservationSource;

// Types from the API crate that appear in this crate's public surface.
pub use innkeep_api::{
    CredentialStatus, CredentialStore, DEFAULT_API_URL, DateRange, Decimal, FileCredentialStore,
    MemoryCredentialStore, OAuthConfig, ReservationSummary, TlsMode, TokenAuthority,
};
