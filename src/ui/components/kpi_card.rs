use dioxus::prelude::*;

use crate::domain::Metric;
use crate::ui::theme::{self, Trend};

#[component]
pub fn KpiCard(metric: Metric) -> Element {
    let trend = Trend::from_change(metric.relative_change);
    let change = percent_label(metric.relative_change);
    let value = if metric.formatted_value.is_empty() {
        "—".to_string()
    } else {
        metric.formatted_value.clone()
    };

    rsx! {
        div {
            class: "kpi-card",
            h3 { class: "kpi-title", "{metric.title}" }
            p { class: "kpi-value", "{value}" }
            p {
                class: "{theme::trend_class(trend)}",
                "{trend.arrow()} {change}"
            }
        }
    }
}

/// Signed percentage for a fractional change, one decimal.
pub fn percent_label(fraction: f64) -> String {
    if !fraction.is_finite() {
        return "—".to_string();
    }
    let pct = fraction * 100.0;
    if pct.abs() < 0.05 {
        "0.0%".to_string()
    } else {
        format!("{pct:+.1}%")
    }
}
