// ── Report domain types ──

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use innkeep_api::{ReservationDetail, ReservationSummary};

/// Fraction of each reservation's resolved total paid as commission (5%).
pub const COMMISSION_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// One commission line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    pub reservation_id: String,
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub source: String,
    pub subtotal: Decimal,
    pub grand_total: Decimal,
    pub commission: Decimal,
}

impl ReportItem {
    /// Combine a list row with its fetched financial detail.
    pub fn from_detail(summary: &ReservationSummary, detail: &ReservationDetail) -> Self {
        let grand_total = detail.resolved_total();
        Self {
            reservation_id: summary.reservation_id.clone(),
            guest_name: summary.guest_name.clone(),
            check_in: summary.check_in,
            check_out: summary.check_out,
            source: summary.source_name.clone(),
            subtotal: detail.resolved_subtotal(),
            grand_total,
            commission: grand_total * COMMISSION_RATE,
        }
    }
}

/// Work dropped during a run because individual remote calls failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkippedWork {
    /// List pages (1-based) that contributed nothing.
    pub pages: Vec<u32>,
    /// Candidates whose detail fetch failed.
    pub reservations: Vec<String>,
}

impl SkippedWork {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.reservations.is_empty()
    }
}

/// Commission report for one period.
///
/// Aggregates are derived from `items` once, at construction, and cannot
/// be set independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    period: String,
    generated_at: DateTime<Utc>,
    items: Vec<ReportItem>,
    total_sales: Decimal,
    total_commission: Decimal,
    skipped: SkippedWork,
}

impl MonthlyReport {
    pub fn new(
        period: impl Into<String>,
        generated_at: DateTime<Utc>,
        items: Vec<ReportItem>,
        skipped: SkippedWork,
    ) -> Self {
        let total_sales = items.iter().map(|i| i.grand_total).sum();
        let total_commission = items.iter().map(|i| i.commission).sum();
        Self {
            period: period.into(),
            generated_at,
            items,
            total_sales,
            total_commission,
            skipped,
        }
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn items(&self) -> &[ReportItem] {
        &self.items
    }

    pub fn total_sales(&self) -> Decimal {
        self.total_sales
    }

    pub fn total_commission(&self) -> Decimal {
        self.total_commission
    }

    pub fn skipped(&self) -> &SkippedWork {
        &self.skipped
    }

    /// `false` when any page or reservation was lost to a failed call.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Raw reservation listing for a date window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationListing {
    pub success: bool,
    /// Matching-record count the PMS reported on page 1.
    pub total_reported: u64,
    pub data: Vec<ReservationSummary>,
    pub skipped_pages: Vec<u32>,
}

impl ReservationListing {
    pub fn is_complete(&self) -> bool {
        self.skipped_pages.is_empty()
    }
}
