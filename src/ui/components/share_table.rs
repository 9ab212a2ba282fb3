use dioxus::prelude::*;

use crate::domain::numeric::format_grouped;
use crate::domain::{ExchangeShare, ValuePie};
use crate::domain::units::DEFAULT_UNIT_LABEL;
use crate::ui::theme;

#[derive(Clone, Debug, PartialEq)]
pub struct ShareRow {
    pub label: String,
    pub value: String,
    /// Fraction of the whole, 0..=1.
    pub share: f64,
}

/// Pie slices as rows. Slices without an explicit share get their part of
/// the summed values.
pub fn pie_rows(pie: &ValuePie) -> Vec<ShareRow> {
    let sum: f64 = pie.slices.iter().map(|slice| slice.value).sum();
    pie.slices
        .iter()
        .map(|slice| {
            let share = slice
                .share
                .unwrap_or(if sum > 0.0 { slice.value / sum } else { 0.0 });
            let mut value = format_grouped(slice.value, 1);
            if let Some(ton) = slice.ton {
                value.push_str(&format!(" · {} {DEFAULT_UNIT_LABEL}", format_grouped(ton, 0)));
            }
            ShareRow {
                label: slice.name.clone(),
                value,
                share,
            }
        })
        .collect()
}

pub fn exchange_rows(shares: &[ExchangeShare]) -> Vec<ShareRow> {
    shares
        .iter()
        .map(|entry| ShareRow {
            label: entry.name.clone(),
            value: format!("{} {}", format_grouped(entry.display_value, 2), entry.display_unit),
            share: entry.share,
        })
        .collect()
}

#[component]
pub fn ShareTable(rows: Vec<ShareRow>, value_header: String, empty_text: String) -> Element {
    if rows.is_empty() {
        return rsx! {
            p { class: "{theme::MUTED}", "{empty_text}" }
        };
    }

    let rows = rows
        .into_iter()
        .map(|row| {
            let pct = (row.share * 100.0).clamp(0.0, 100.0);
            (row, format!("{pct:.1}%"), format!("width: {pct:.1}%"))
        })
        .collect::<Vec<_>>();

    rsx! {
        table {
            class: "{theme::TABLE}",
            thead {
                tr {
                    th { "Name" }
                    th { class: "{theme::NUMERIC_CELL}", "{value_header}" }
                    th { "Share" }
                }
            }
            tbody {
                for (row, pct, width) in rows {
                    tr {
                        td { "{row.label}" }
                        td { class: "{theme::NUMERIC_CELL}", "{row.value}" }
                        td {
                            div {
                                class: "{theme::BAR_TRACK}",
                                div { class: "{theme::BAR_FILL}", style: "{width}" }
                            }
                            span { class: "{theme::MUTED}", "{pct}" }
                        }
                    }
                }
            }
        }
    }
}
