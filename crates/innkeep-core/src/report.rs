// ── Commission aggregation ──
//
// fetch all -> keep commission candidates -> detail calls in small
// batches -> one ReportItem per surviving candidate -> MonthlyReport.

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use innkeep_api::{DateRange, ReservationSummary};

use crate::config::DetailOptions;
use crate::error::CoreError;
use crate::fetch::PaginatedBatchFetcher;
use crate::matcher::SourceMatcher;
use crate::model::{MonthlyReport, ReportItem, SkippedWork};
use crate::source::ReservationSource;

pub struct CommissionAggregator<'a, S> {
    fetcher: PaginatedBatchFetcher<'a, S>,
    details: DetailOptions,
    matcher: &'a SourceMatcher,
}

impl<'a, S: ReservationSource> CommissionAggregator<'a, S> {
    pub fn new(
        fetcher: PaginatedBatchFetcher<'a, S>,
        details: DetailOptions,
        matcher: &'a SourceMatcher,
    ) -> Self {
        Self {
            fetcher,
            details: details.normalized(),
            matcher,
        }
    }

    /// Build the commission report for every reservation checked out in `range`.
    ///
    /// Fails only when the first list page cannot be fetched. Lost pages
    /// and failed detail calls are listed in [`MonthlyReport::skipped`].
    pub async fn build_report(
        &self,
        range: DateRange,
        label: &str,
    ) -> Result<MonthlyReport, CoreError> {
        let fetched = self.fetcher.fetch_all(range).await?;
        let progress = self.fetcher.progress();

        let candidates: Vec<&ReservationSummary> = fetched
            .summaries
            .iter()
            .filter(|s| self.matcher.is_candidate(&s.source_name))
            .collect();
        debug!(
            fetched = fetched.summaries.len(),
            candidates = candidates.len(),
            "filtered by source"
        );
        progress.publish(format!(
            "{} of {} reservations come from commission sources",
            candidates.len(),
            fetched.summaries.len()
        ));

        let (items, failed) = self.enrich(&candidates).await;

        let report = MonthlyReport::new(
            label,
            Utc::now(),
            items,
            SkippedWork {
                pages: fetched.skipped_pages,
                reservations: failed,
            },
        );

        info!(
            period = report.period(),
            items = report.items().len(),
            total_sales = %report.total_sales(),
            total_commission = %report.total_commission(),
            complete = report.is_complete(),
            "report generated"
        );
        progress.publish(format!(
            "Report ready: {} reservations, sales {}, commission {}",
            report.items().len(),
            report.total_sales().round_dp(2),
            report.total_commission().round_dp(2)
        ));

        Ok(report)
    }

    /// Fetch detail for each candidate, batch by batch. Returns the items
    /// in candidate order and the ids whose detail call failed.
    async fn enrich(&self, candidates: &[&ReservationSummary]) -> (Vec<ReportItem>, Vec<String>) {
        let source = self.fetcher.source();
        let progress = self.fetcher.progress();
        let mut items = Vec::with_capacity(candidates.len());
        let mut failed = Vec::new();

        let batches: Vec<_> = candidates.chunks(self.details.batch_size).collect();
        let batch_count = batches.len();
        let mut processed = 0;

        for (index, batch) in batches.into_iter().enumerate() {
            let results = join_all(
                batch
                    .iter()
                    .map(|summary| source.reservation_detail(&summary.reservation_id)),
            )
            .await;

            for (summary, result) in batch.iter().zip(results) {
                match result {
                    Ok(detail) => items.push(ReportItem::from_detail(summary, &detail)),
                    Err(error) => {
                        warn!(
                            reservation_id = %summary.reservation_id,
                            %error,
                            "detail fetch failed, leaving reservation out of the report"
                        );
                        failed.push(summary.reservation_id.clone());
                    }
                }
            }

            processed += batch.len();
            progress.publish(format!(
                "Processed {processed}/{} reservations",
                candidates.len()
            ));

            if index + 1 < batch_count {
                tokio::time::sleep(self.details.inter_batch_delay).await;
            }
        }

        (items, failed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use chrono::NaiveDate;
    use innkeep_api::{Decimal, ReservationDetail, RoomCharge};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::FetchOptions;
    use crate::progress::ProgressChannel;
    use crate::source::fake::{FakeSource, summary};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn november() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 30).unwrap(),
        )
    }

    fn total(amount: &str) -> ReservationDetail {
        ReservationDetail {
            total: Some(dec(amount)),
            ..ReservationDetail::default()
        }
    }

    fn details(batch_size: usize) -> DetailOptions {
        DetailOptions {
            batch_size,
            inter_batch_delay: Duration::from_secs(1),
        }
    }

    async fn run(source: &FakeSource, batch_size: usize) -> MonthlyReport {
        let progress = ProgressChannel::new();
        let matcher = SourceMatcher::default();
        let fetcher = PaginatedBatchFetcher::new(source, FetchOptions::default(), &progress);
        CommissionAggregator::new(fetcher, details(batch_size), &matcher)
            .build_report(november(), "November 2024")
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_total_and_room_fallback_commissions() {
        let source = FakeSource::from_summaries(vec![
            summary("R1", "Google ADS"),
            summary("R2", "Website/Booking Engine"),
        ])
        .detail("R1", total("150.00"))
        .detail(
            "R2",
            ReservationDetail {
                room_charges: vec![
                    RoomCharge { total: Some(dec("50")) },
                    RoomCharge { total: Some(dec("25")) },
                ],
                ..ReservationDetail::default()
            },
        );

        let report = run(&source, 3).await;

        let items = report.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].commission, dec("7.50"));
        assert_eq!(items[1].grand_total, dec("75"));
        assert_eq!(items[1].commission, dec("3.75"));
        assert_eq!(report.total_sales(), dec("225.00"));
        assert_eq!(report.total_commission(), dec("11.25"));
        assert_eq!(report.period(), "November 2024");
    }

    #[tokio::test(start_paused = true)]
    async fn non_candidate_sources_are_dropped_without_detail_calls() {
        let source = FakeSource::from_summaries(vec![
            summary("R1", "Direct"),
            summary("R2", "Facebook ADS"),
            summary("R3", "Booking.com"),
        ])
        .detail("R2", total("40"));

        let report = run(&source, 3).await;

        assert_eq!(report.items().len(), 1);
        assert_eq!(report.items()[0].reservation_id, "R2");
        let detail_ids: Vec<String> = source.detail_calls().into_iter().map(|(id, _)| id).collect();
        assert_eq!(detail_ids, vec!["R2".to_owned()]);
        assert!(report.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_detail_drops_only_that_reservation() {
        let source = FakeSource::with_reservations(3, "Google ADS")
            .detail("R1", total("100"))
            .failing_detail("R2")
            .detail("R3", total("20"));

        let report = run(&source, 3).await;

        let ids: Vec<&str> = report.items().iter().map(|i| i.reservation_id.as_str()).collect();
        assert_eq!(ids, ["R1", "R3"]);
        assert_eq!(report.total_sales(), dec("120"));
        assert_eq!(report.total_commission(), dec("6.00"));
        assert_eq!(report.skipped().reservations, vec!["R2".to_owned()]);
        assert!(!report.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn detail_batches_are_throttled() {
        let source = FakeSource::with_reservations(7, "Google ADS");
        let started = tokio::time::Instant::now();

        let report = run(&source, 3).await;
        assert_eq!(report.items().len(), 7);

        let calls = source.detail_calls();
        let at = |id: &str| {
            calls
                .iter()
                .find(|(call, _)| call == id)
                .map(|(_, at)| at.duration_since(started))
                .unwrap()
        };
        // [R1 R2 R3] [R4 R5 R6] [R7]
        assert_eq!(at("R1"), at("R3"));
        assert_eq!(at("R4"), at("R6"));
        assert!(at("R4") >= at("R1") + Duration::from_secs(1));
        assert!(at("R7") >= at("R4") + Duration::from_secs(1));
        assert!(started.elapsed() < at("R7") + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_pages_are_carried_into_the_report() {
        let source = FakeSource::with_reservations(250, "Google ADS").failing_page(2);

        let report = run(&source, 10).await;

        assert_eq!(report.skipped().pages, vec![2]);
        assert_eq!(report.items().len(), 150);
        assert!(!report.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_window_yields_an_empty_report() {
        let source = FakeSource::default();

        let report = run(&source, 3).await;

        assert!(report.items().is_empty());
        assert_eq!(report.total_sales(), Decimal::ZERO);
        assert!(source.detail_calls().is_empty());
    }
}
