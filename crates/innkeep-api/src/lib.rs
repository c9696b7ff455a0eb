// innkeep-api: Async Rust client for the hotel PMS reservations API
//
// Credential persistence, the OAuth2 token authority, the authenticated
// request executor and the typed reservation endpoints.

pub mod auth;
pub mod error;
pub mod executor;
pub mod oauth;
pub mod pms;
pub mod transport;

pub use auth::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenPair};
pub use error::Error;
pub use executor::{MAX_AUTH_RETRIES, RequestExecutor};
pub use oauth::{CredentialStatus, DEFAULT_SCOPES, OAuthConfig, TokenAuthority};
pub use pms::{
    DEFAULT_API_URL, DEFAULT_SOURCE_NAME, DateRange, PmsClient, ReservationDetail,
    ReservationPage, ReservationQuery, ReservationSummary, RoomCharge,
};
pub use transport::{TlsMode, TransportConfig};

// Downstream crates name these without a direct dependency.
pub use reqwest::Method;
pub use rust_decimal::Decimal;
pub use secrecy::{ExposeSecret, SecretString};
