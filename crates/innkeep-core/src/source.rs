// ── Reservation source seam ──
//
// The pipeline talks to the PMS through this trait so batching, ordering
// and failure handling can be exercised against an in-process fake.

use std::future::Future;

use innkeep_api::{Error, PmsClient, ReservationDetail, ReservationPage, ReservationQuery};

/// Anything that can serve reservation list pages and per-reservation detail.
pub trait ReservationSource: Sync {
    /// One 1-based page of the reservation list.
    fn reservation_page(
        &self,
        query: &ReservationQuery,
        page: u32,
    ) -> impl Future<Output = Result<ReservationPage, Error>> + Send;

    fn reservation_detail(
        &self,
        reservation_id: &str,
    ) -> impl Future<Output = Result<ReservationDetail, Error>> + Send;
}

impl ReservationSource for PmsClient {
    fn reservation_page(
        &self,
        query: &ReservationQuery,
        page: u32,
    ) -> impl Future<Output = Result<ReservationPage, Error>> + Send {
        self.reservations_page(query, page)
    }

    fn reservation_detail(
        &self,
        reservation_id: &str,
    ) -> impl Future<Output = Result<ReservationDetail, Error>> + Send {
        PmsClient::reservation_detail(self, reservation_id)
    }
}
