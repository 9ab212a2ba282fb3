use dioxus::prelude::*;

use crate::{
    app::{persist_user_state, LoadedView},
    domain::{AppState, DebugInfo},
    ui::{components::toast::ToastMessage, theme},
};

#[component]
pub fn DiagnosticsPage() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let view = use_context::<Resource<LoadedView>>();

    let enabled = state.read().diagnostics;
    let debug = view
        .read()
        .as_ref()
        .and_then(|loaded| loaded.view.debug_info.clone());

    rsx! {
        section { class: "{theme::PANEL}",
            div { class: "{theme::PANEL_HEADER}",
                h2 { class: "{theme::PANEL_TITLE}", "Upstream diagnostics" }
                label { class: "toggle",
                    input {
                        r#type: "checkbox",
                        checked: enabled,
                        onchange: move |evt| {
                            state.with_mut(|st| st.diagnostics = evt.checked());
                            persist_user_state(&state, toasts);
                        },
                    }
                    span { "Collect per-endpoint diagnostics" }
                }
            }
            match (enabled, debug) {
                (false, _) => rsx! {
                    p { class: "{theme::MUTED}",
                        "Enable diagnostics to see how each backend call went on the next load."
                    }
                },
                (true, None) => rsx! {
                    p { class: "{theme::MUTED}",
                        "No diagnostics yet. They appear once a backend is configured and a load completes."
                    }
                },
                (true, Some(info)) => rsx! { DiagnosticsTable { info } },
            }
        }
    }
}

#[component]
fn DiagnosticsTable(info: DebugInfo) -> Element {
    let failed = info.endpoints.iter().filter(|entry| !entry.ok).count();
    let summary = format!(
        "Base {} · {} ms total · {failed} failed",
        info.base_url, info.total_elapsed_ms
    );
    let endpoints = info.endpoints;
    rsx! {
        p { class: "{theme::MUTED}", "{summary}" }
        table { class: "{theme::TABLE}",
            thead {
                tr {
                    th { "Endpoint" }
                    th { "Status" }
                    th { class: "{theme::NUMERIC_CELL}", "Attempts" }
                    th { class: "{theme::NUMERIC_CELL}", "Elapsed" }
                    th { "Detail" }
                }
            }
            tbody {
                for entry in endpoints {
                    tr {
                        td {
                            div { "{entry.endpoint}" }
                            div { class: "{theme::MUTED} url", "{entry.url}" }
                        }
                        td { span { class: "{theme::status_badge(entry.ok)}", "{entry.status}" } }
                        td { class: "{theme::NUMERIC_CELL}", "{entry.attempts}" }
                        td { class: "{theme::NUMERIC_CELL}", "{entry.elapsed_ms} ms" }
                        td { class: "error-text", "{entry.error.clone().unwrap_or_default()}" }
                    }
                }
            }
        }
    }
}
