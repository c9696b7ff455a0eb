// PMS API request and response types
//
// Field names follow the PMS wire format (`reservationID`, `startDate`,
// ...). Amounts arrive as strings or numbers depending on the endpoint
// and firmware, so they go through a lenient decimal deserializer.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source assigned to reservations that carry none.
pub const DEFAULT_SOURCE_NAME: &str = "Direct";

/// Reservation status filter used for commission runs.
pub const STATUS_CHECKED_OUT: &str = "checked_out";

// ── Request ──────────────────────────────────────────────────────────

/// Inclusive check-out date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// `from` is on or before `to`.
    pub fn is_ordered(&self) -> bool {
        self.from <= self.to
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// Parameters shared by every page of one reservation-list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationQuery {
    pub range: DateRange,
    pub property_id: Option<String>,
    pub status: String,
    pub page_size: u32,
}

impl ReservationQuery {
    pub fn checked_out(range: DateRange, page_size: u32) -> Self {
        Self {
            range,
            property_id: None,
            status: STATUS_CHECKED_OUT.into(),
            page_size,
        }
    }

    pub fn with_property(mut self, property_id: Option<String>) -> Self {
        self.property_id = property_id;
        self
    }

    /// Query string for one page (1-based).
    pub fn params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(6);
        if let Some(ref id) = self.property_id {
            params.push(("property_id", id.clone()));
        }
        params.push(("status", self.status.clone()));
        params.push(("checkout_from", self.range.from.format("%Y-%m-%d").to_string()));
        params.push(("checkout_to", self.range.to.format("%Y-%m-%d").to_string()));
        params.push(("limit", self.page_size.to_string()));
        params.push(("page", page.to_string()));
        params
    }
}

// ── Envelope ─────────────────────────────────────────────────────────

/// `{ "success": bool, "data": T, "total": n, "message": "..." }`
///
/// The PMS reports some failures with HTTP 200 and `success: false`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

// ── Reservation list ─────────────────────────────────────────────────

/// One row of the reservation list. List rows carry no reliable amount;
/// `total_hint` is whatever the list endpoint reported (often zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationSummary {
    #[serde(rename = "reservationID")]
    pub reservation_id: String,
    #[serde(rename = "guestName", default, deserialize_with = "string_or_default")]
    pub guest_name: String,
    #[serde(rename = "startDate")]
    pub check_in: NaiveDate,
    #[serde(rename = "endDate")]
    pub check_out: NaiveDate,
    #[serde(
        rename = "sourceName",
        default = "default_source_name",
        deserialize_with = "source_name"
    )]
    pub source_name: String,
    #[serde(rename = "total", default, deserialize_with = "amount")]
    pub total_hint: Option<Decimal>,
}

/// One page of results plus the overall matching-record count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationPage {
    pub total: u64,
    pub items: Vec<ReservationSummary>,
}

// ── Reservation detail ───────────────────────────────────────────────

/// Per-room charge line on a reservation detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomCharge {
    #[serde(default, deserialize_with = "amount")]
    pub total: Option<Decimal>,
}

/// Financial detail for one reservation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationDetail {
    #[serde(rename = "reservationID", default, deserialize_with = "string_or_default")]
    pub reservation_id: String,
    #[serde(default, deserialize_with = "amount")]
    pub total: Option<Decimal>,
    #[serde(rename = "grandTotal", default, deserialize_with = "amount")]
    pub grand_total: Option<Decimal>,
    #[serde(rename = "subTotal", default, deserialize_with = "amount")]
    pub sub_total: Option<Decimal>,
    #[serde(rename = "rooms", default, deserialize_with = "vec_or_default")]
    pub room_charges: Vec<RoomCharge>,
}

impl ReservationDetail {
    /// Explicit aggregate total, else the sum of room charges, else zero.
    pub fn resolved_total(&self) -> Decimal {
        self.total
            .or(self.grand_total)
            .unwrap_or_else(|| self.room_charges.iter().filter_map(|r| r.total).sum())
    }

    /// Pre-tax amount when reported, otherwise the resolved total.
    pub fn resolved_subtotal(&self) -> Decimal {
        self.sub_total.unwrap_or_else(|| self.resolved_total())
    }
}

// ── Lenient deserializers ────────────────────────────────────────────

fn default_source_name() -> String {
    DEFAULT_SOURCE_NAME.into()
}

fn source_name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default_source_name))
}

fn string_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn vec_or_default<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

/// Accept `"150.00"`, `150`, `150.5`, `null` or `""`.
fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_amount(&s).map_err(de::Error::custom),
        Some(Value::Number(n)) => parse_amount(&n.to_string()).map_err(de::Error::custom),
        Some(other) => Err(de::Error::custom(format!(
            "expected a monetary amount, got {other}"
        ))),
    }
}

pub(crate) fn parse_amount(raw: &str) -> Result<Option<Decimal>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(Some)
        .map_err(|e| format!("invalid amount {trimmed:?}: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn detail_prefers_explicit_total() {
        let detail: ReservationDetail = serde_json::from_value(json!({
            "reservationID": "R1",
            "total": "150.00",
            "rooms": [{ "total": "999" }]
        }))
        .unwrap();
        assert_eq!(detail.resolved_total(), dec("150.00"));
    }

    #[test]
    fn detail_falls_back_to_grand_total_then_rooms() {
        let grand: ReservationDetail =
            serde_json::from_value(json!({ "grandTotal": 80.5 })).unwrap();
        assert_eq!(grand.resolved_total(), dec("80.5"));

        let rooms: ReservationDetail = serde_json::from_value(json!({
            "rooms": [{ "total": "50" }, { "total": "25" }]
        }))
        .unwrap();
        assert_eq!(rooms.resolved_total(), dec("75"));
    }

    #[test]
    fn detail_without_amounts_resolves_to_zero() {
        let detail: ReservationDetail =
            serde_json::from_value(json!({ "rooms": null, "total": "" })).unwrap();
        assert_eq!(detail.resolved_total(), Decimal::ZERO);
        assert_eq!(detail.resolved_subtotal(), Decimal::ZERO);
    }

    #[test]
    fn subtotal_defaults_to_resolved_total() {
        let detail: ReservationDetail =
            serde_json::from_value(json!({ "total": "110", "subTotal": "100" })).unwrap();
        assert_eq!(detail.resolved_subtotal(), dec("100"));

        let detail: ReservationDetail = serde_json::from_value(json!({ "total": "110" })).unwrap();
        assert_eq!(detail.resolved_subtotal(), dec("110"));
    }

    #[test]
    fn summary_defaults_missing_source_to_direct() {
        let summary: ReservationSummary = serde_json::from_value(json!({
            "reservationID": "R9",
            "guestName": "Ada",
            "startDate": "2024-11-01",
            "endDate": "2024-11-03",
            "sourceName": null,
            "total": 0
        }))
        .unwrap();
        assert_eq!(summary.source_name, DEFAULT_SOURCE_NAME);
        assert_eq!(summary.total_hint, Some(Decimal::ZERO));
    }

    #[test]
    fn garbage_amount_is_rejected() {
        let res = serde_json::from_value::<ReservationDetail>(json!({ "total": "abc" }));
        assert!(res.is_err());
    }

    #[test]
    fn query_params_include_window_and_page() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 30).unwrap(),
        );
        let query = ReservationQuery::checked_out(range, 100).with_property(Some("42".into()));

        assert_eq!(
            query.params(3),
            vec![
                ("property_id", "42".to_owned()),
                ("status", "checked_out".to_owned()),
                ("checkout_from", "2024-11-01".to_owned()),
                ("checkout_to", "2024-11-30".to_owned()),
                ("limit", "100".to_owned()),
                ("page", "3".to_owned()),
            ]
        );
    }
}
