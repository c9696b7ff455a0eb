//! Report subcommand handlers.

use std::fmt::Write as _;

use owo_colors::OwoColorize;
use tabled::Tabled;

use innkeep_core::{Decimal, MonthlyReport, ReportItem, ReportPeriod, Reporter};

use crate::cli::{GlobalOpts, ReportArgs, ReportCommand};
use crate::error::CliError;
use crate::output;
use crate::progress::Spinner;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Reservation")]
    id: String,
    #[tabled(rename = "Guest")]
    guest: String,
    #[tabled(rename = "Check-in")]
    check_in: String,
    #[tabled(rename = "Check-out")]
    check_out: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Subtotal")]
    subtotal: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Commission")]
    commission: String,
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

impl From<&ReportItem> for ItemRow {
    fn from(i: &ReportItem) -> Self {
        Self {
            id: i.reservation_id.clone(),
            guest: i.guest_name.clone(),
            check_in: i.check_in.to_string(),
            check_out: i.check_out.to_string(),
            source: i.source.clone(),
            subtotal: money(i.subtotal),
            total: money(i.grand_total),
            commission: money(i.commission),
        }
    }
}

fn report_table(report: &MonthlyReport, color: bool) -> String {
    let mut out = String::new();
    let heading = report.period().to_owned();
    if color {
        let _ = writeln!(out, "{}", heading.bold());
    } else {
        let _ = writeln!(out, "{heading}");
    }
    let _ = writeln!(
        out,
        "Generated {}",
        report.generated_at().format("%Y-%m-%d %H:%M:%S UTC")
    );

    if report.items().is_empty() {
        let _ = writeln!(out, "\nNo commission-eligible reservations.");
    } else {
        let rows: Vec<ItemRow> = report.items().iter().map(ItemRow::from).collect();
        let _ = writeln!(out, "{}", output::table(&rows));
    }

    let _ = writeln!(out, "Reservations:      {}", report.items().len());
    let _ = writeln!(out, "Total sales:       {}", money(report.total_sales()));
    let commission = money(report.total_commission());
    if color {
        let _ = write!(out, "Total commission:  {}", commission.green().bold());
    } else {
        let _ = write!(out, "Total commission:  {commission}");
    }

    if !report.is_complete() {
        let skipped = report.skipped();
        let warning = format!(
            "Incomplete: {} page(s) and {} reservation(s) could not be fetched",
            skipped.pages.len(),
            skipped.reservations.len()
        );
        if color {
            let _ = write!(out, "\n{}", warning.yellow());
        } else {
            let _ = write!(out, "\n{warning}");
        }
        if !skipped.reservations.is_empty() {
            let _ = write!(out, "\nSkipped reservations: {}", skipped.reservations.join(", "));
        }
    }

    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    reporter: &Reporter,
    args: ReportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let period = match args.command {
        ReportCommand::Month { year, month } => ReportPeriod::Month { year, month },
        ReportCommand::Range { from, to, title } => ReportPeriod::Range { from, to, title },
        ReportCommand::LastMonth => ReportPeriod::PreviousMonth,
        ReportCommand::LastWeek => ReportPeriod::PreviousWeek,
    };
    tracing::debug!(?period, "building report");

    let spinner = Spinner::attach(reporter.progress(), global.quiet);
    let result = reporter.report(&period).await;
    if let Some(spinner) = spinner {
        spinner.finish();
    }
    let report = result?;

    let color = output::should_color(&global.color);
    let out = output::render(&global.output, &report, |r| report_table(r, color))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
