use serde::{Deserialize, Serialize};

use super::series::{default_range, format_date, DateRange};
use super::view::MonthlyPoint;

/// UI-side state shared through the component tree. The view itself is
/// refetched, never stored here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// Ask the aggregator for per-endpoint diagnostics.
    pub diagnostics: bool,
    /// Raw `YYYY-MM-DD` values of the range inputs; blank until seeded.
    pub range_from: String,
    pub range_to: String,
    /// Bumped to force a refetch.
    pub refresh: u32,
    /// A fetch is in flight.
    pub loading: bool,
}

impl AppState {
    /// The selected chart range, when both inputs hold valid dates.
    pub fn selected_range(&self) -> Option<DateRange> {
        DateRange::parse(&self.range_from, &self.range_to)
    }

    /// Fill blank range inputs from the data once it arrives. A range the
    /// user already picked (or restored from disk) is left alone.
    pub fn seed_range(&mut self, points: &[MonthlyPoint], current_year: i32) -> bool {
        if !self.range_from.is_empty() && !self.range_to.is_empty() {
            return false;
        }
        match default_range(points, current_year) {
            Some(range) => {
                self.range_from = format_date(range.from);
                self.range_to = format_date(range.to);
                true
            }
            None => false,
        }
    }

    pub fn clear_range(&mut self) {
        self.range_from.clear();
        self.range_to.clear();
    }

    pub fn apply_persisted(&mut self, persisted: PersistedState) {
        self.diagnostics = persisted.diagnostics;
        self.range_from = persisted.range_from.unwrap_or_default();
        self.range_to = persisted.range_to.unwrap_or_default();
    }

    pub fn to_persisted(&self) -> PersistedState {
        let keep = |raw: &str| (!raw.trim().is_empty()).then(|| raw.to_string());
        PersistedState {
            diagnostics: self.diagnostics,
            range_from: keep(&self.range_from),
            range_to: keep(&self.range_to),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub diagnostics: bool,
    #[serde(default)]
    pub range_from: Option<String>,
    #[serde(default)]
    pub range_to: Option<String>,
}
