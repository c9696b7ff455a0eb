// PMS API client
//
// Typed endpoints over `RequestExecutor`: the reservation list (one
// page per call) and the per-reservation detail. Envelope unwrapping
// lives here; pagination strategy lives in `innkeep-core`.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;
use url::Url;

use super::types::{Envelope, ReservationDetail, ReservationPage, ReservationQuery, ReservationSummary};
use crate::error::{Error, body_preview};
use crate::executor::RequestExecutor;
use crate::oauth::TokenAuthority;
use crate::transport::TransportConfig;

/// Default public endpoint of the PMS API.
pub const DEFAULT_API_URL: &str = "https://hotels.cloudbeds.com/api/v1.1";

const RESERVATIONS_ENDPOINT: &str = "getReservations";
const RESERVATION_ENDPOINT: &str = "getReservation";

/// Async client for the PMS reservations API.
pub struct PmsClient {
    executor: RequestExecutor,
}

impl PmsClient {
    pub fn new(
        base_url: Url,
        authority: Arc<TokenAuthority>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self::with_client(transport.build_client()?, base_url, authority))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, authority: Arc<TokenAuthority>) -> Self {
        Self {
            executor: RequestExecutor::new(http, base_url, authority),
        }
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn authority(&self) -> &Arc<TokenAuthority> {
        self.executor.authority()
    }

    /// Fetch one page (1-based) of the reservation list.
    pub async fn reservations_page(
        &self,
        query: &ReservationQuery,
        page: u32,
    ) -> Result<ReservationPage, Error> {
        let params = query.params(page);
        let value = self
            .executor
            .execute(Method::GET, RESERVATIONS_ENDPOINT, &params)
            .await?;

        let envelope: Envelope<Vec<ReservationSummary>> = unwrap_envelope(value, RESERVATIONS_ENDPOINT)?;
        let items = envelope.data.unwrap_or_default();
        trace!(page, count = items.len(), total = ?envelope.total, "reservation page");

        Ok(ReservationPage {
            total: envelope.total.unwrap_or(0),
            items,
        })
    }

    /// Fetch the financial detail for one reservation.
    pub async fn reservation_detail(&self, reservation_id: &str) -> Result<ReservationDetail, Error> {
        let params = [("reservationID", reservation_id.to_owned())];
        let value = self
            .executor
            .execute(Method::GET, RESERVATION_ENDPOINT, &params)
            .await?;

        let envelope: Envelope<ReservationDetail> = unwrap_envelope(value, RESERVATION_ENDPOINT)?;
        let mut detail = envelope.data.unwrap_or_default();
        if detail.reservation_id.is_empty() {
            reservation_id.clone_into(&mut detail.reservation_id);
        }
        Ok(detail)
    }
}

/// Decode the envelope, turning `success: false` into `Error::Api`.
fn unwrap_envelope<T: DeserializeOwned>(value: Value, endpoint: &str) -> Result<Envelope<T>, Error> {
    let raw = value.to_string();
    let envelope: Envelope<T> = serde_json::from_value(value).map_err(|e| {
        Error::Deserialization {
            message: format!("{e} (endpoint: {endpoint})"),
            body: body_preview(&raw),
        }
    })?;

    if envelope.success == Some(false) {
        return Err(Error::Api {
            message: envelope
                .message
                .clone()
                .unwrap_or_else(|| format!("{endpoint} reported success=false")),
        });
    }

    Ok(envelope)
}
