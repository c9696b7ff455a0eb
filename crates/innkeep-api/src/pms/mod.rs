pub mod client;
pub mod types;

pub use client::{DEFAULT_API_URL, PmsClient};
pub use types::{
    DEFAULT_SOURCE_NAME, DateRange, ReservationDetail, ReservationPage, ReservationQuery,
    ReservationSummary, RoomCharge, STATUS_CHECKED_OUT,
};
