//! Date-range helpers over the monthly product series.
//!
//! These are pure functions the views call whenever the selected range
//! changes; nothing here holds state between calls.

use time::{macros::format_description, Date, Month};

use super::view::MonthlyPoint;

/// Inclusive calendar range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub from: Date,
    pub to: Date,
}

impl DateRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(from: Date, to: Date) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn parse(from: &str, to: &str) -> Option<Self> {
        Some(Self::new(parse_date(from)?, parse_date(to)?))
    }

    pub fn contains(&self, date: Date) -> bool {
        self.from <= date && date <= self.to
    }

    /// `Some(year)` when the range spans January through December of a
    /// single year, which the series header renders as a yearly total.
    pub fn full_year(&self) -> Option<i32> {
        let same_year = self.from.year() == self.to.year();
        let january_to_december =
            self.from.month() == Month::January && self.to.month() == Month::December;
        (same_year && january_to_december).then_some(self.from.year())
    }

    pub fn label(&self) -> String {
        format!("{} – {}", format_date(self.from), format_date(self.to))
    }
}

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Points whose date falls inside `range`. Without a range the series is
/// returned as-is; with one, points with unparseable dates are dropped.
pub fn derive_filtered_series(raw: &[MonthlyPoint], range: Option<&DateRange>) -> Vec<MonthlyPoint> {
    let Some(range) = range else {
        return raw.to_vec();
    };

    raw.iter()
        .filter(|point| parse_date(&point.date).is_some_and(|date| range.contains(date)))
        .cloned()
        .collect()
}

/// Initial range for the series view: January 1st through the latest date
/// in `current_year`, or through the latest date overall when the current
/// year has no data yet. The start is pinned to January 1st even when the
/// data begins later in the year.
pub fn default_range(points: &[MonthlyPoint], current_year: i32) -> Option<DateRange> {
    let dates: Vec<Date> = points
        .iter()
        .filter_map(|point| parse_date(&point.date))
        .collect();

    let this_year = dates
        .iter()
        .copied()
        .filter(|date| date.year() == current_year)
        .max();
    let latest = this_year.or_else(|| dates.iter().copied().max())?;
    let jan_first = Date::from_calendar_date(latest.year(), Month::January, 1).ok()?;

    Some(DateRange::new(jan_first, latest))
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeriesSummary {
    pub code: String,
    /// Sum of all counts for the code.
    pub total: i64,
    /// Count at the most recent date, 0 when the code has no points.
    pub last: i64,
}

pub fn summarize(points: &[MonthlyPoint], codes: &[&str]) -> Vec<SeriesSummary> {
    codes
        .iter()
        .map(|code| {
            let matching = points.iter().filter(|point| point.series_key == *code);
            let total = matching.clone().map(|point| point.count).sum();
            let last = matching
                .max_by(|a, b| a.date.cmp(&b.date))
                .map(|point| point.count)
                .unwrap_or(0);
            SeriesSummary {
                code: code.to_string(),
                total,
                last,
            }
        })
        .collect()
}
