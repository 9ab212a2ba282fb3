use dioxus::prelude::*;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    config,
    domain::{AppState, DashboardView},
    infra::aggregator::Aggregator,
    ui::{
        components::toast::{push_toast, Toast, ToastKind, ToastMessage},
        pages::{DashboardPage, DiagnosticsPage},
        shell::Shell,
    },
    util::{
        assets,
        persistence::{load_persisted_state, save_persisted_state},
    },
};

#[derive(Routable, Clone, PartialEq)]
pub enum Route {
    #[route("/")]
    Dashboard {},
    #[route("/diagnostics")]
    Diagnostics {},
}

/// One aggregation result as the views see it.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedView {
    pub view: DashboardView,
    pub backend_configured: bool,
    pub fetched_at: OffsetDateTime,
}

#[component]
pub fn App() -> Element {
    let mut state = use_signal(AppState::default);
    use_hook(move || {
        if let Some(saved) = load_persisted_state() {
            state.with_mut(|st| st.apply_persisted(saved));
        }
    });
    use_context_provider(|| state);

    let toasts = use_signal(Vec::<ToastMessage>::new);
    use_context_provider(|| toasts);

    // Only these two fields trigger a refetch; range edits stay local.
    let diagnostics = use_memo(move || state.read().diagnostics);
    let refresh = use_memo(move || state.read().refresh);

    let view = use_resource(move || {
        let diagnostics = diagnostics();
        let _ = refresh();
        async move {
            state.with_mut(|st| st.loading = true);
            let loaded = load_view(diagnostics, toasts).await;
            state.with_mut(|st| st.loading = false);
            loaded
        }
    });
    use_context_provider(|| view);

    use_effect(move || {
        let Some(loaded) = view.read().as_ref().cloned() else {
            return;
        };
        let needs_seed = {
            let st = state.peek();
            st.range_from.is_empty() || st.range_to.is_empty()
        };
        if needs_seed {
            let year = loaded.fetched_at.year();
            state.with_mut(|st| {
                st.seed_range(&loaded.view.monthly_series, year);
            });
        }
    });

    rsx! {
        document::Style { "{assets::main_css()}" }
        Router::<Route> {}
        Toast {}
    }
}

pub fn persist_user_state(state: &Signal<AppState>, toasts: Signal<Vec<ToastMessage>>) {
    let snapshot = state.with(|st| st.to_persisted());
    if let Err(err) = save_persisted_state(&snapshot) {
        warn!("[state] failed to persist preferences: {err}");
        push_toast(toasts, ToastKind::Error, format!("Could not save preferences: {err}"));
    }
}

async fn load_view(diagnostics: bool, toasts: Signal<Vec<ToastMessage>>) -> LoadedView {
    let config = config::load();
    let backend_configured = config.base_url.is_some();

    let view = match Aggregator::new(config) {
        Ok(aggregator) => aggregator.get_dashboard_view(diagnostics).await,
        Err(err) => {
            warn!("[app] {err}");
            push_toast(toasts, ToastKind::Error, format!("Dashboard unavailable: {err}"));
            DashboardView::default()
        }
    };

    if !backend_configured {
        push_toast(
            toasts,
            ToastKind::Info,
            format!("No backend configured. Set {} or base_url in config.toml.", config::ENV_BASE_URL),
        );
    }
    info!("[app] dashboard loaded (diagnostics={diagnostics}, empty={})", view.is_empty());

    LoadedView {
        view,
        backend_configured,
        fetched_at: OffsetDateTime::now_utc(),
    }
}

#[component]
pub fn Dashboard() -> Element {
    rsx! { Shell { DashboardPage {} } }
}

#[component]
pub fn Diagnostics() -> Element {
    rsx! { Shell { DiagnosticsPage {} } }
}
