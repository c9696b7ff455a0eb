// ── Report periods ──
//
// Calendar arithmetic for the named report windows. Resolution is pure:
// "today" is an argument, never read from the clock here.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use innkeep_api::DateRange;

use crate::error::CoreError;

/// A reporting window, before it is pinned to concrete dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPeriod {
    /// One calendar month.
    Month { year: i32, month: u32 },
    /// The full calendar month before today.
    PreviousMonth,
    /// Monday to Sunday of the ISO week before today.
    PreviousWeek,
    /// Arbitrary inclusive window with a caller-chosen title.
    Range {
        from: NaiveDate,
        to: NaiveDate,
        title: Option<String>,
    },
}

/// A period pinned to dates, with its report heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub range: DateRange,
    pub label: String,
}

impl ReportPeriod {
    pub fn resolve(&self, today: NaiveDate) -> Result<ResolvedPeriod, CoreError> {
        match *self {
            Self::Month { year, month } => {
                let range = month_range(year, month)?;
                Ok(ResolvedPeriod {
                    label: range.from.format("%B %Y").to_string(),
                    range,
                })
            }
            Self::PreviousMonth => {
                let last = today
                    .with_day(1)
                    .and_then(|first| first.pred_opt())
                    .ok_or_else(|| out_of_range(today))?;
                let range = month_range(last.year(), last.month())?;
                Ok(ResolvedPeriod {
                    label: format!("MONTHLY REPORT - {}", range.from.format("%B %Y")),
                    range,
                })
            }
            Self::PreviousWeek => {
                let back = u64::from(today.weekday().num_days_from_monday()) + 7;
                let monday = today
                    .checked_sub_days(Days::new(back))
                    .ok_or_else(|| out_of_range(today))?;
                let sunday = monday
                    .checked_add_days(Days::new(6))
                    .ok_or_else(|| out_of_range(today))?;
                Ok(ResolvedPeriod {
                    label: format!("WEEKLY REPORT - {monday} to {sunday}"),
                    range: DateRange::new(monday, sunday),
                })
            }
            Self::Range {
                from,
                to,
                ref title,
            } => {
                let range = DateRange::new(from, to);
                if !range.is_ordered() {
                    return Err(CoreError::InvalidPeriod {
                        message: format!("start {from} is after end {to}"),
                    });
                }
                Ok(ResolvedPeriod {
                    label: title.clone().unwrap_or_else(|| range.to_string()),
                    range,
                })
            }
        }
    }
}

/// First to last calendar day of `year`-`month`.
pub fn month_range(year: i32, month: u32) -> Result<DateRange, CoreError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| CoreError::InvalidPeriod {
        message: format!("{year}-{month:02} is not a calendar month"),
    })?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| out_of_range(first))?;
    Ok(DateRange::new(first, last))
}

fn out_of_range(date: NaiveDate) -> CoreError {
    CoreError::InvalidPeriod {
        message: format!("period around {date} is outside the supported calendar"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_spans_first_to_last_day() {
        let resolved = ReportPeriod::Month { year: 2024, month: 11 }
            .resolve(date(2025, 1, 15))
            .unwrap();
        assert_eq!(resolved.range, DateRange::new(date(2024, 11, 1), date(2024, 11, 30)));
        assert_eq!(resolved.label, "November 2024");
    }

    #[test]
    fn february_respects_leap_years() {
        assert_eq!(month_range(2024, 2).unwrap().to, date(2024, 2, 29));
        assert_eq!(month_range(2023, 2).unwrap().to, date(2023, 2, 28));
    }

    #[test]
    fn december_ends_on_the_31st() {
        let range = month_range(2024, 12).unwrap();
        assert_eq!(range, DateRange::new(date(2024, 12, 1), date(2024, 12, 31)));
    }

    #[test]
    fn invalid_month_is_rejected() {
        for month in [0, 13] {
            let err = ReportPeriod::Month { year: 2024, month }
                .resolve(date(2024, 6, 1))
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidPeriod { .. }));
        }
    }

    #[test]
    fn previous_month_wraps_the_year() {
        let resolved = ReportPeriod::PreviousMonth.resolve(date(2025, 1, 1)).unwrap();
        assert_eq!(resolved.range, DateRange::new(date(2024, 12, 1), date(2024, 12, 31)));
        assert_eq!(resolved.label, "MONTHLY REPORT - December 2024");
    }

    #[test]
    fn previous_week_is_monday_to_sunday() {
        // 2024-11-13 is a Wednesday
        let resolved = ReportPeriod::PreviousWeek.resolve(date(2024, 11, 13)).unwrap();
        assert_eq!(resolved.range, DateRange::new(date(2024, 11, 4), date(2024, 11, 10)));
        assert_eq!(resolved.label, "WEEKLY REPORT - 2024-11-04 to 2024-11-10");

        // On a Monday the previous week ends yesterday.
        let monday = ReportPeriod::PreviousWeek.resolve(date(2024, 11, 11)).unwrap();
        assert_eq!(monday.range, DateRange::new(date(2024, 11, 4), date(2024, 11, 10)));
    }

    #[test]
    fn range_uses_title_or_dates() {
        let titled = ReportPeriod::Range {
            from: date(2024, 11, 1),
            to: date(2024, 11, 15),
            title: Some("First half".into()),
        }
        .resolve(date(2024, 12, 1))
        .unwrap();
        assert_eq!(titled.label, "First half");

        let untitled = ReportPeriod::Range {
            from: date(2024, 11, 1),
            to: date(2024, 11, 15),
            title: None,
        }
        .resolve(date(2024, 12, 1))
        .unwrap();
        assert_eq!(untitled.label, "2024-11-01 to 2024-11-15");
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = ReportPeriod::Range {
            from: date(2024, 11, 15),
            to: date(2024, 11, 1),
            title: None,
        }
        .resolve(date(2024, 12, 1))
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidPeriod { .. }));
    }
}
