use dioxus::prelude::*;

use crate::{
    app::{persist_user_state, LoadedView},
    config::{product_name, DEFAULT_PRODUCTS},
    domain::{
        numeric::format_grouped,
        series::{derive_filtered_series, summarize, DateRange, SeriesSummary},
        AppState, CoalLatest, DashboardView, Metric, MonthlyPoint,
    },
    ui::{
        components::{
            kpi_card::{percent_label, KpiCard},
            series_table::SeriesTable,
            share_table::{exchange_rows, pie_rows, ShareTable},
            toast::ToastMessage,
        },
        theme,
    },
};

#[component]
pub fn DashboardPage() -> Element {
    let view = use_context::<Resource<LoadedView>>();
    let loaded = view.read().as_ref().cloned();

    let Some(loaded) = loaded else {
        return rsx! {
            section { class: "{theme::PANEL}",
                p { class: "{theme::MUTED}", "Loading dashboard…" }
            }
        };
    };

    if !loaded.backend_configured {
        return rsx! {
            section { class: "{theme::PANEL}",
                p { class: "{theme::NOTICE}",
                    "No statistics backend is configured, so there is nothing to show yet."
                }
            }
        };
    }

    let DashboardView {
        metrics,
        monthly_series,
        value_pie,
        exchange_shares,
        coal_latest,
        ..
    } = loaded.view;

    let pie_title = if value_pie.year_label.is_empty() {
        "Export value by product".to_string()
    } else {
        format!("Export value by product, {}", value_pie.year_label)
    };
    let export_total = value_pie
        .export_total
        .map(|total| format_grouped(total, 1))
        .unwrap_or_else(|| "—".to_string());
    let pie = pie_rows(&value_pie);
    let exchange = exchange_shares.as_deref().map(exchange_rows);

    rsx! {
        MetricsSection { metrics }
        SeriesSection { points: monthly_series }
        div { class: "two-col",
            section { class: "{theme::PANEL}",
                div { class: "{theme::PANEL_HEADER}",
                    h2 { class: "{theme::PANEL_TITLE}", "{pie_title}" }
                    span { class: "{theme::MUTED}", "Total exports: {export_total}" }
                }
                ShareTable {
                    rows: pie,
                    value_header: "Value".to_string(),
                    empty_text: "Export values unavailable.".to_string(),
                }
            }
            section { class: "{theme::PANEL}",
                div { class: "{theme::PANEL_HEADER}",
                    h2 { class: "{theme::PANEL_TITLE}", "Exchange trading" }
                }
                match exchange {
                    Some(rows) => rsx! {
                        ShareTable {
                            rows,
                            value_header: "Traded".to_string(),
                            empty_text: "No exchange trades reported.".to_string(),
                        }
                    },
                    None => rsx! { p { class: "{theme::MUTED}", "Exchange data unavailable." } },
                }
            }
        }
        CoalSection { coal: coal_latest }
    }
}

#[component]
fn MetricsSection(metrics: Option<Vec<Metric>>) -> Element {
    match metrics {
        Some(metrics) if !metrics.is_empty() => rsx! {
            div { class: "{theme::KPI_GRID}",
                for metric in metrics {
                    KpiCard { metric }
                }
            }
        },
        Some(_) => rsx! { Fragment {} },
        None => rsx! {
            section { class: "{theme::PANEL}",
                p { class: "{theme::MUTED}", "Headline metrics unavailable." }
            }
        },
    }
}

#[component]
fn SeriesSection(points: Vec<MonthlyPoint>) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();

    let (range_from, range_to, range) = state.with(|st| {
        (st.range_from.clone(), st.range_to.clone(), st.selected_range())
    });
    let filtered = derive_filtered_series(&points, range.as_ref());
    let codes = DEFAULT_PRODUCTS
        .iter()
        .map(|product| product.code)
        .collect::<Vec<_>>();
    let summaries = summarize(&filtered, &codes);
    let heading = range_heading(range.as_ref());

    rsx! {
        section { class: "{theme::PANEL}",
            div { class: "{theme::PANEL_HEADER}",
                h2 { class: "{theme::PANEL_TITLE}", "Export volume by product · {heading}" }
                div { class: "range-inputs",
                    input {
                        class: "{theme::INPUT}",
                        r#type: "date",
                        value: "{range_from}",
                        onchange: move |evt| {
                            state.with_mut(|st| st.range_from = evt.value());
                            persist_user_state(&state, toasts);
                        },
                    }
                    span { "–" }
                    input {
                        class: "{theme::INPUT}",
                        r#type: "date",
                        value: "{range_to}",
                        onchange: move |evt| {
                            state.with_mut(|st| st.range_to = evt.value());
                            persist_user_state(&state, toasts);
                        },
                    }
                    button {
                        class: "{theme::BUTTON}",
                        title: "Back to the current year",
                        onclick: move |_| {
                            state.with_mut(|st| {
                                st.clear_range();
                                st.seed_range(&points, time::OffsetDateTime::now_utc().year());
                            });
                            persist_user_state(&state, toasts);
                        },
                        "Reset"
                    }
                }
            }
            div { class: "summary-row",
                for summary in summaries {
                    SummaryChip { summary }
                }
            }
            SeriesTable { points: filtered }
        }
    }
}

#[component]
fn SummaryChip(summary: SeriesSummary) -> Element {
    let name = product_name(&summary.code).unwrap_or(summary.code.as_str()).to_string();
    let total = format_grouped(summary.total as f64, 0);
    let last = format_grouped(summary.last as f64, 0);
    rsx! {
        div { class: "summary-chip",
            span { class: "summary-name", "{name}" }
            span { "Total {total}" }
            span { class: "{theme::MUTED}", "Latest {last}" }
        }
    }
}

#[component]
fn CoalSection(coal: Option<CoalLatest>) -> Element {
    let Some(coal) = coal else {
        return rsx! {
            section { class: "{theme::PANEL}",
                h2 { class: "{theme::PANEL_TITLE}", "Coking coal (CNY)" }
                p { class: "{theme::MUTED}", "Coal prices unavailable." }
            }
        };
    };

    let rows = coal
        .items
        .iter()
        .map(|item| {
            let latest = item.latest.map_or_else(|| "—".to_string(), |v| format_grouped(v, 2));
            let prev = item.prev_year.map_or_else(|| "—".to_string(), |v| format_grouped(v, 2));
            let change = item.yoy_pct.map(|pct| pct / 100.0);
            let trend = theme::Trend::from_change(change.unwrap_or(0.0));
            let change = change.map_or_else(|| "—".to_string(), percent_label);
            (item.name.clone(), latest, prev, theme::trend_class(trend), change)
        })
        .collect::<Vec<_>>();

    rsx! {
        section { class: "{theme::PANEL}",
            div { class: "{theme::PANEL_HEADER}",
                h2 { class: "{theme::PANEL_TITLE}", "Coking coal (CNY)" }
                span { class: "{theme::MUTED}", "{coal.date}" }
            }
            table { class: "{theme::TABLE}",
                thead {
                    tr {
                        th { "Market" }
                        th { class: "{theme::NUMERIC_CELL}", "Latest" }
                        th { class: "{theme::NUMERIC_CELL}", "Year ago" }
                        th { class: "{theme::NUMERIC_CELL}", "YoY" }
                    }
                }
                tbody {
                    for (name, latest, prev, trend_class, change) in rows {
                        tr {
                            td { "{name}" }
                            td { class: "{theme::NUMERIC_CELL}", "{latest}" }
                            td { class: "{theme::NUMERIC_CELL}", "{prev}" }
                            td { class: "{theme::NUMERIC_CELL} {trend_class}", "{change}" }
                        }
                    }
                }
            }
        }
    }
}

/// `2025 full year` for a January–December range, the dates otherwise.
fn range_heading(range: Option<&DateRange>) -> String {
    match range {
        None => "all months".to_string(),
        Some(range) => match range.full_year() {
            Some(year) => format!("{year} full year"),
            None => range.label(),
        },
    }
}
