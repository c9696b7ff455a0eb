// ── Paginated batch fetch ──
//
// Page 1 first (it carries the overall total), then the remaining pages
// in sequential batches. Pages inside a batch run concurrently; the next
// batch waits for the whole previous batch plus the inter-batch delay.
// Losing page 1 is fatal. Losing any later page costs only that page.

use futures_util::future::join_all;
use tracing::{debug, warn};

use innkeep_api::{DateRange, ReservationQuery, ReservationSummary};

use crate::config::FetchOptions;
use crate::error::CoreError;
use crate::progress::ProgressChannel;
use crate::source::ReservationSource;

/// Upper bound on pages read in one fetch, whatever total the PMS reports.
pub const MAX_PAGES: u32 = 10_000;

/// Number of pages needed for `total` records, at most [`MAX_PAGES`].
/// Zero records still take one page.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    let pages = total
        .div_ceil(u64::from(page_size.max(1)))
        .clamp(1, u64::from(MAX_PAGES));
    u32::try_from(pages).unwrap_or(MAX_PAGES)
}

/// Split pages `2..=total_pages` into consecutive groups of at most `batch_size`.
pub fn plan_batches(total_pages: u32, batch_size: usize) -> Vec<Vec<u32>> {
    let step = u32::try_from(batch_size.max(1)).unwrap_or(u32::MAX);
    (2..=total_pages)
        .step_by(batch_size.max(1))
        .map(|first| (first..=first.saturating_add(step - 1).min(total_pages)).collect())
        .collect()
}

/// Everything one fetch produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// Overall matching-record count reported on page 1.
    pub total: u64,
    /// Summaries in ascending page order.
    pub summaries: Vec<ReservationSummary>,
    /// Pages that failed and contributed nothing.
    pub skipped_pages: Vec<u32>,
}

/// Retrieves a full date window from a [`ReservationSource`].
pub struct PaginatedBatchFetcher<'a, S> {
    source: &'a S,
    options: FetchOptions,
    property_id: Option<&'a str>,
    progress: &'a ProgressChannel,
}

impl<'a, S: ReservationSource> PaginatedBatchFetcher<'a, S> {
    pub fn new(source: &'a S, options: FetchOptions, progress: &'a ProgressChannel) -> Self {
        Self {
            source,
            options: options.normalized(),
            property_id: None,
            progress,
        }
    }

    #[must_use]
    pub fn for_property(mut self, property_id: Option<&'a str>) -> Self {
        self.property_id = property_id;
        self
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn progress(&self) -> &'a ProgressChannel {
        self.progress
    }

    pub fn options(&self) -> FetchOptions {
        self.options
    }

    pub async fn fetch_all(&self, range: DateRange) -> Result<FetchOutcome, CoreError> {
        let FetchOptions {
            page_size,
            batch_size,
            inter_batch_delay,
        } = self.options;
        let query = ReservationQuery::checked_out(range, page_size)
            .with_property(self.property_id.map(str::to_owned));

        self.progress
            .publish(format!("Fetching checked-out reservations for {range}"));

        let first = self.source.reservation_page(&query, 1).await?;
        let total = first.total;
        let total_pages = page_count(total, page_size);
        if u64::from(total_pages) * u64::from(page_size) < total {
            warn!(
                total,
                max_pages = MAX_PAGES,
                "reported total exceeds the page ceiling, reading the first {MAX_PAGES} pages only"
            );
        }
        self.progress.publish(format!(
            "{total} reservations reported across {total_pages} page(s)"
        ));

        let mut outcome = FetchOutcome {
            total,
            summaries: first.items,
            skipped_pages: Vec::new(),
        };

        if total <= u64::from(page_size) {
            debug!(total, "single page fetch");
            self.finish(&outcome);
            return Ok(outcome);
        }

        let batches = plan_batches(total_pages, batch_size);
        let batch_count = batches.len();
        let query = &query;

        for (index, pages) in batches.iter().enumerate() {
            debug!(batch = index + 1, ?pages, "requesting page batch");

            let results = join_all(pages.iter().map(|&page| async move {
                (page, self.source.reservation_page(query, page).await)
            }))
            .await;

            for (page, result) in results {
                match result {
                    Ok(page_data) => outcome.summaries.extend(page_data.items),
                    Err(error) => {
                        warn!(page, %error, "page fetch failed, continuing without it");
                        outcome.skipped_pages.push(page);
                    }
                }
            }

            self.progress.publish(format!(
                "Batch {}/{batch_count} done: {} reservations so far",
                index + 1,
                outcome.summaries.len()
            ));

            if index + 1 < batch_count {
                tokio::time::sleep(inter_batch_delay).await;
            }
        }

        self.finish(&outcome);
        Ok(outcome)
    }

    fn finish(&self, outcome: &FetchOutcome) {
        if outcome.skipped_pages.is_empty() {
            self.progress.publish(format!(
                "Fetched {} reservations",
                outcome.summaries.len()
            ));
        } else {
            self.progress.publish(format!(
                "Fetched {} reservations, {} page(s) skipped after errors",
                outcome.summaries.len(),
                outcome.skipped_pages.len()
            ));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::source::fake::FakeSource;

    fn november() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 30).unwrap(),
        )
    }

    fn options(page_size: u32, batch_size: usize) -> FetchOptions {
        FetchOptions {
            page_size,
            batch_size,
            inter_batch_delay: Duration::from_secs(1),
        }
    }

    fn ids(outcome: &FetchOutcome) -> Vec<String> {
        outcome
            .summaries
            .iter()
            .map(|s| s.reservation_id.clone())
            .collect()
    }

    #[test]
    fn plan_for_250_records_is_page_one_then_two_and_three() {
        assert_eq!(page_count(250, 100), 3);
        assert_eq!(plan_batches(3, 5), vec![vec![2, 3]]);
    }

    #[test]
    fn plan_caps_each_batch_at_batch_size() {
        let batches = plan_batches(12, 5);
        assert_eq!(
            batches,
            vec![vec![2, 3, 4, 5, 6], vec![7, 8, 9, 10, 11], vec![12]]
        );
        // 1 + ceil((totalPages - 1) / batchSize)
        assert_eq!(1 + batches.len(), 1 + 11_usize.div_ceil(5));
    }

    #[test]
    fn plan_is_empty_for_a_single_page() {
        assert!(plan_batches(1, 5).is_empty());
        assert_eq!(page_count(0, 100), 1);
        assert_eq!(page_count(100, 100), 1);
        assert_eq!(page_count(101, 100), 2);
    }

    #[test]
    fn absurd_totals_are_capped() {
        assert_eq!(page_count(1_000_000_000_000, 100), MAX_PAGES);
        assert_eq!(page_count(u64::MAX, 1), MAX_PAGES);

        let batches = plan_batches(MAX_PAGES, 10);
        assert_eq!(batches.len(), 1000);
        assert_eq!(batches.last().map(Vec::len), Some(9));
        assert_eq!(batches.last().and_then(|b| b.last()), Some(&MAX_PAGES));
    }

    #[tokio::test(start_paused = true)]
    async fn overstated_total_reads_empty_trailing_pages() {
        // Page 1 claims six rows but only three exist: page 3 comes back empty.
        let source = FakeSource::with_reservations(3, "Google ADS").reporting_total(6);
        let progress = ProgressChannel::new();
        let fetcher = PaginatedBatchFetcher::new(&source, options(2, 5), &progress);

        let outcome = fetcher.fetch_all(november()).await.unwrap();

        assert_eq!(outcome.total, 6);
        assert_eq!(ids(&outcome), vec!["R1", "R2", "R3"]);
        assert!(outcome.skipped_pages.is_empty());
        let pages: Vec<u32> = source.page_calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(pages.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn small_result_sets_issue_exactly_one_call() {
        for count in [0, 1, 57, 100] {
            let source = FakeSource::with_reservations(count, "Google ADS");
            let progress = ProgressChannel::new();
            let fetcher = PaginatedBatchFetcher::new(&source, options(100, 5), &progress);

            let outcome = fetcher.fetch_all(november()).await.unwrap();

            assert_eq!(source.calls().len(), 1, "count = {count}");
            assert_eq!(outcome.summaries.len(), count);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pages_are_concatenated_in_page_order() {
        let source = FakeSource::with_reservations(25, "Google ADS");
        let progress = ProgressChannel::new();
        let fetcher = PaginatedBatchFetcher::new(&source, options(10, 5), &progress);

        let outcome = fetcher.fetch_all(november()).await.unwrap();

        let expected: Vec<String> = (1..=25).map(|n| format!("R{n}")).collect();
        assert_eq!(ids(&outcome), expected);
        assert_eq!(outcome.total, 25);
        assert!(outcome.skipped_pages.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn batches_are_sequential_with_a_delay_between_each_pair() {
        // 95 records / 10 per page = 10 pages: [1] then [2..=5] [6..=9] [10]
        let source = FakeSource::with_reservations(95, "Google ADS");
        let progress = ProgressChannel::new();
        let fetcher = PaginatedBatchFetcher::new(&source, options(10, 4), &progress);
        let started = tokio::time::Instant::now();

        let outcome = fetcher.fetch_all(november()).await.unwrap();
        assert_eq!(outcome.summaries.len(), 95);

        let calls = source.page_calls();
        let issued_at = |page: u32| {
            calls
                .iter()
                .find(|(p, _)| *p == page)
                .map(|(_, at)| at.duration_since(started))
                .unwrap()
        };

        // Every page in a batch is issued together.
        for batch in [[2, 3, 4, 5], [6, 7, 8, 9]] {
            let first = issued_at(batch[0]);
            assert!(batch.iter().all(|&p| issued_at(p) == first));
        }

        // Each batch waits for the previous one (slowest page: 20 - page ms)
        // plus the one-second delay.
        let batch1 = issued_at(2);
        let batch2 = issued_at(6);
        let batch3 = issued_at(10);
        assert!(batch2 >= batch1 + Duration::from_millis(18) + Duration::from_secs(1));
        assert!(batch3 >= batch2 + Duration::from_millis(14) + Duration::from_secs(1));
        assert_eq!(calls.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn no_delay_after_the_last_batch() {
        let source = FakeSource::with_reservations(250, "Google ADS");
        let progress = ProgressChannel::new();
        let fetcher = PaginatedBatchFetcher::new(&source, options(100, 5), &progress);
        let started = tokio::time::Instant::now();

        fetcher.fetch_all(november()).await.unwrap();

        // page 1 (19ms) + one batch of pages 2 and 3 (18ms), no trailing sleep
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(source.page_calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_page_is_skipped_without_losing_the_others() {
        let source = FakeSource::with_reservations(40, "Google ADS").failing_page(3);
        let progress = ProgressChannel::new();
        let fetcher = PaginatedBatchFetcher::new(&source, options(10, 5), &progress);

        let outcome = fetcher.fetch_all(november()).await.unwrap();

        assert_eq!(outcome.skipped_pages, vec![3]);
        assert_eq!(outcome.summaries.len(), 30);
        let ids = ids(&outcome);
        assert_eq!(ids.first().map(String::as_str), Some("R1"));
        assert!(!ids.iter().any(|id| id == "R21"));
        assert_eq!(ids.last().map(String::as_str), Some("R40"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_first_page_is_fatal() {
        let source = FakeSource::with_reservations(40, "Google ADS").failing_page(1);
        let progress = ProgressChannel::new();
        let fetcher = PaginatedBatchFetcher::new(&source, options(10, 5), &progress);

        let result = fetcher.fetch_all(november()).await;

        assert!(matches!(result, Err(CoreError::Upstream { status: Some(429), .. })));
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_size_is_clamped_to_ten() {
        let source = FakeSource::with_reservations(200, "Google ADS");
        let progress = ProgressChannel::new();
        let fetcher = PaginatedBatchFetcher::new(&source, options(10, 50), &progress);
        assert_eq!(fetcher.options().batch_size, 10);

        fetcher.fetch_all(november()).await.unwrap();

        let calls = source.page_calls();
        let second_batch_start = calls.iter().find(|(p, _)| *p == 12).unwrap().1;
        let in_first_batch = calls.iter().filter(|(_, at)| *at < second_batch_start).count();
        // page 1 plus pages 2..=11
        assert_eq!(in_first_batch, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_reports_start_total_batches_and_completion() {
        let source = FakeSource::with_reservations(30, "Google ADS");
        let progress = ProgressChannel::new();
        let mut rx = progress.subscribe();
        let fetcher = PaginatedBatchFetcher::new(&source, options(10, 1), &progress);

        fetcher.fetch_all(november()).await.unwrap();

        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        assert_eq!(
            messages,
            vec![
                "Fetching checked-out reservations for 2024-11-01 to 2024-11-30".to_owned(),
                "30 reservations reported across 3 page(s)".to_owned(),
                "Batch 1/2 done: 20 reservations so far".to_owned(),
                "Batch 2/2 done: 30 reservations so far".to_owned(),
                "Fetched 30 reservations".to_owned(),
            ]
        );
    }
}
