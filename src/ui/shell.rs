use dioxus::prelude::*;

use crate::app::{LoadedView, Route};
use crate::domain::AppState;
use crate::ui::theme;
use crate::util::version::{version_label, APP_NAME};

#[component]
pub fn Shell(children: Element) -> Element {
    let current_route = use_route::<Route>();
    let nav = use_navigator();
    let mut state = use_context::<Signal<AppState>>();
    let view = use_context::<Resource<LoadedView>>();

    let loading = state.read().loading;
    let fetched_at = view.read().as_ref().map(|loaded| {
        format!(
            "{:02}:{:02} UTC",
            loaded.fetched_at.hour(),
            loaded.fetched_at.minute()
        )
    });
    let status = match (loading, fetched_at) {
        (true, _) => "Loading…".to_string(),
        (false, Some(time)) => format!("Updated {time}"),
        (false, None) => String::new(),
    };

    rsx! {
        div { class: "app",
            header { class: "app-header",
                div { class: "brand",
                    h1 { "{APP_NAME}" }
                    span { class: "{theme::MUTED}", "{version_label()}" }
                }
                nav { class: "app-nav",
                    NavButton {
                        active: matches!(current_route, Route::Dashboard {}),
                        onclick: move |_| { nav.push(Route::Dashboard {}); },
                        label: "Dashboard",
                    }
                    NavButton {
                        active: matches!(current_route, Route::Diagnostics {}),
                        onclick: move |_| { nav.push(Route::Diagnostics {}); },
                        label: "Diagnostics",
                    }
                }
                div { class: "header-actions",
                    span { class: "{theme::MUTED}", "{status}" }
                    button {
                        class: "{theme::BUTTON}",
                        disabled: loading,
                        onclick: move |_| state.with_mut(|st| st.refresh = st.refresh.wrapping_add(1)),
                        "Refresh"
                    }
                }
            }
            main { class: "app-main",
                {children}
            }
        }
    }
}

#[component]
fn NavButton(active: bool, onclick: EventHandler<()>, label: &'static str) -> Element {
    rsx! {
        button {
            class: "{theme::nav_button(active)}",
            onclick: move |_| onclick.call(()),
            "{label}"
        }
    }
}
