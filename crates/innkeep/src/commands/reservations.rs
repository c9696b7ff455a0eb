//! Reservation listing handler.

use tabled::Tabled;

use innkeep_core::{DateRange, Reporter, ReservationListing, ReservationSummary};

use crate::cli::{GlobalOpts, ReservationsArgs};
use crate::error::CliError;
use crate::output;
use crate::progress::Spinner;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReservationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Guest")]
    guest: String,
    #[tabled(rename = "Check-in")]
    check_in: String,
    #[tabled(rename = "Check-out")]
    check_out: String,
    #[tabled(rename = "Source")]
    source: String,
}

impl From<&ReservationSummary> for ReservationRow {
    fn from(r: &ReservationSummary) -> Self {
        Self {
            id: r.reservation_id.clone(),
            guest: r.guest_name.clone(),
            check_in: r.check_in.to_string(),
            check_out: r.check_out.to_string(),
            source: r.source_name.clone(),
        }
    }
}

fn listing_table(listing: &ReservationListing) -> String {
    let rows: Vec<ReservationRow> = listing.data.iter().map(ReservationRow::from).collect();
    let mut out = output::table(&rows);
    out.push_str(&format!(
        "\n{} reservations ({} reported by the PMS)",
        listing.data.len(),
        listing.total_reported
    ));
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    reporter: &Reporter,
    args: ReservationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let range = DateRange::new(args.from, args.to);

    let spinner = Spinner::attach(reporter.progress(), global.quiet);
    let result = reporter.list_reservations(range).await;
    if let Some(spinner) = spinner {
        spinner.finish();
    }
    let listing = result?;

    if !listing.is_complete() {
        tracing::warn!(
            pages = ?listing.skipped_pages,
            "some pages could not be fetched; the listing is incomplete"
        );
    }

    let out = output::render(&global.output, &listing, listing_table)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
