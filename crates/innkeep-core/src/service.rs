// ── Reporter facade ──
//
// Wires one PMS account end to end: credential store -> token authority
// -> authenticated executor -> PMS client, plus the batch fetcher and
// commission aggregator on top. The CLI talks only to this type.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::debug;

use innkeep_api::{CredentialStore, DateRange, PmsClient, TokenAuthority, TransportConfig};

use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::fetch::PaginatedBatchFetcher;
use crate::model::{MonthlyReport, ReservationListing};
use crate::period::{ReportPeriod, ResolvedPeriod, month_range};
use crate::progress::ProgressChannel;
use crate::report::CommissionAggregator;

pub struct Reporter {
    config: ServiceConfig,
    client: PmsClient,
    progress: ProgressChannel,
}

impl Reporter {
    /// Build the HTTP stack for `config`. No network traffic happens here.
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn CredentialStore>,
        progress: ProgressChannel,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let http = transport.build_client()?;
        let authority = Arc::new(TokenAuthority::with_client(
            http.clone(),
            config.oauth.clone(),
            store,
        ));
        let client = PmsClient::with_client(http, config.api_url.clone(), authority);
        debug!(api_url = %config.api_url, "reporter ready");

        Ok(Self {
            config,
            client,
            progress,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn authority(&self) -> &Arc<TokenAuthority> {
        self.client.authority()
    }

    pub fn client(&self) -> &PmsClient {
        &self.client
    }

    pub fn progress(&self) -> &ProgressChannel {
        &self.progress
    }

    fn fetcher(&self) -> PaginatedBatchFetcher<'_, PmsClient> {
        PaginatedBatchFetcher::new(&self.client, self.config.fetch, &self.progress)
            .for_property(self.config.property_id.as_deref())
    }

    /// Every checked-out reservation in `range`, in page order.
    pub async fn list_reservations(
        &self,
        range: DateRange,
    ) -> Result<ReservationListing, CoreError> {
        ensure_ordered(range)?;
        let outcome = self.fetcher().fetch_all(range).await?;
        Ok(ReservationListing {
            success: true,
            total_reported: outcome.total,
            data: outcome.summaries,
            skipped_pages: outcome.skipped_pages,
        })
    }

    pub async fn build_report(
        &self,
        range: DateRange,
        label: &str,
    ) -> Result<MonthlyReport, CoreError> {
        ensure_ordered(range)?;
        CommissionAggregator::new(self.fetcher(), self.config.details, &self.config.sources)
            .build_report(range, label)
            .await
    }

    /// Report for one calendar month, labelled `"<Month> <year>"`.
    pub async fn monthly_report(&self, year: i32, month: u32) -> Result<MonthlyReport, CoreError> {
        let range = month_range(year, month)?;
        let label = range.from.format("%B %Y").to_string();
        self.build_report(range, &label).await
    }

    /// Report for a named period, resolved against the local date.
    pub async fn report(&self, period: &ReportPeriod) -> Result<MonthlyReport, CoreError> {
        self.report_as_of(period, Local::now().date_naive()).await
    }

    pub async fn report_as_of(
        &self,
        period: &ReportPeriod,
        today: NaiveDate,
    ) -> Result<MonthlyReport, CoreError> {
        let ResolvedPeriod { range, label } = period.resolve(today)?;
        self.build_report(range, &label).await
    }
}

fn ensure_ordered(range: DateRange) -> Result<(), CoreError> {
    if range.is_ordered() {
        Ok(())
    } else {
        Err(CoreError::InvalidPeriod {
            message: format!("start {} is after end {}", range.from, range.to),
        })
    }
}
