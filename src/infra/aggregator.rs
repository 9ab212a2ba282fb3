//! Fan-out/fan-in over the six upstream datasets.
//!
//! - Every call is independent: a failure only blanks its own section.
//! - All six calls run concurrently inside the caller's task and are all
//!   awaited; nothing is spawned, so a panicking builder (a bug, not bad
//!   data) unwinds straight to the caller instead of posing as a failed
//!   request.
//! - No state survives between calls. The only shared resource is the
//!   `reqwest` connection pool.

use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::fetch::{fetch_json, FetchError, FetchPolicy};
use super::shapes::{self, ShapeError};
use crate::config::{DashboardConfig, EndpointPaths};
use crate::domain::{DashboardView, DebugInfo, EndpointDiagnostic};

const USER_AGENT: &str = concat!("trade-dashboard/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Metrics,
    ProductsTimeline,
    ProductsValueMonthly,
    ExportTotal,
    ExchangeTimeline,
    CoalLatest,
}

impl Endpoint {
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Metrics => "metrics",
            Endpoint::ProductsTimeline => "products_timeline",
            Endpoint::ProductsValueMonthly => "products_value_monthly",
            Endpoint::ExportTotal => "export_total",
            Endpoint::ExchangeTimeline => "exchange_timeline",
            Endpoint::CoalLatest => "coal_latest",
        }
    }

    fn path(self, paths: &EndpointPaths) -> &str {
        match self {
            Endpoint::Metrics => &paths.metrics,
            Endpoint::ProductsTimeline => &paths.products_timeline,
            Endpoint::ProductsValueMonthly => &paths.products_value_monthly,
            Endpoint::ExportTotal => &paths.export_total,
            Endpoint::ExchangeTimeline => &paths.exchange_timeline,
            Endpoint::CoalLatest => &paths.coal_latest,
        }
    }
}

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
enum EndpointFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl EndpointFailure {
    fn label(&self) -> &'static str {
        match self {
            EndpointFailure::Fetch(err) => err.kind().label(),
            EndpointFailure::Shape(_) => "parse_error",
            EndpointFailure::Url(_) => "network_error",
        }
    }
}

struct EndpointOutcome<T> {
    endpoint: Endpoint,
    url: String,
    result: Result<T, EndpointFailure>,
    attempts: u32,
    elapsed: Duration,
}

impl<T> EndpointOutcome<T> {
    fn diagnostic(&self) -> EndpointDiagnostic {
        let (ok, status, error) = match &self.result {
            Ok(_) => (true, "success", None),
            Err(err) => (false, err.label(), Some(err.to_string())),
        };
        EndpointDiagnostic {
            endpoint: self.endpoint.name().to_string(),
            url: self.url.clone(),
            ok,
            status: status.to_string(),
            attempts: self.attempts,
            elapsed_ms: duration_ms(self.elapsed),
            error,
        }
    }

    fn into_value(self) -> Option<T> {
        self.result.ok()
    }
}

#[derive(Clone)]
pub struct Aggregator {
    http: Client,
    config: DashboardConfig,
    policy: FetchPolicy,
}

impl Aggregator {
    pub fn new(config: DashboardConfig) -> Result<Self, AggregatorError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        let policy = FetchPolicy::from_config(&config);
        Ok(Self {
            http,
            config,
            policy,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Build the dashboard view. Never fails: unreachable or broken
    /// upstreams leave their sections at the defaults. With `diagnostics`,
    /// per-endpoint outcomes are attached as `debug_info`.
    pub async fn get_dashboard_view(&self, diagnostics: bool) -> DashboardView {
        let Some(base) = self.config.base_url.as_ref() else {
            debug!("[dashboard] no backend configured; serving empty view");
            return DashboardView::default();
        };

        let started = Instant::now();
        let (metrics, timeline, value_pie, export_total, exchange, coal) = tokio::join!(
            self.call(base, Endpoint::Metrics, shapes::metrics::build),
            self.call(base, Endpoint::ProductsTimeline, shapes::monthly::build),
            self.call(base, Endpoint::ProductsValueMonthly, shapes::value_pie::build),
            self.call(base, Endpoint::ExportTotal, shapes::export_total::build),
            self.call(base, Endpoint::ExchangeTimeline, shapes::exchange::build),
            self.call(base, Endpoint::CoalLatest, shapes::coal::build),
        );
        let elapsed = started.elapsed();

        let endpoints = vec![
            metrics.diagnostic(),
            timeline.diagnostic(),
            value_pie.diagnostic(),
            export_total.diagnostic(),
            exchange.diagnostic(),
            coal.diagnostic(),
        ];
        let succeeded = endpoints.iter().filter(|entry| entry.ok).count();
        info!(
            "[dashboard] aggregated {succeeded}/{} sections in {}ms",
            endpoints.len(),
            duration_ms(elapsed)
        );

        let mut view = DashboardView {
            metrics: metrics.into_value(),
            monthly_series: timeline.into_value().unwrap_or_default(),
            exchange_shares: exchange.into_value(),
            coal_latest: coal.into_value(),
            ..DashboardView::default()
        };

        let mut embedded_total = None;
        if let Some(pie) = value_pie.into_value() {
            view.value_pie.slices = pie.slices;
            view.value_pie.year_label = pie.year_label;
            embedded_total = pie.embedded_export_total;
        }
        view.value_pie.export_total = match export_total.into_value() {
            Some(total) => total,
            None => embedded_total,
        };

        if diagnostics {
            view.debug_info = Some(DebugInfo {
                base_url: base.to_string(),
                total_elapsed_ms: duration_ms(elapsed),
                endpoints,
            });
        }

        view
    }

    async fn call<T, F>(&self, base: &Url, endpoint: Endpoint, build: F) -> EndpointOutcome<T>
    where
        F: FnOnce(Value) -> Result<T, ShapeError>,
    {
        let path = endpoint.path(&self.config.endpoints).trim_start_matches('/');
        let url = match base.join(path) {
            Ok(url) => url,
            Err(err) => {
                return EndpointOutcome {
                    endpoint,
                    url: format!("{base}{path}"),
                    result: Err(err.into()),
                    attempts: 0,
                    elapsed: Duration::ZERO,
                }
            }
        };

        let report = fetch_json(&self.http, url.clone(), &self.policy).await;
        let result = report
            .result
            .map_err(EndpointFailure::from)
            .and_then(|payload| build(payload).map_err(EndpointFailure::from));

        if let Err(err) = &result {
            debug!(
                "[dashboard] {} failed ({}) after {} attempt(s): {err}",
                endpoint.name(),
                err.label(),
                report.attempts
            );
        }

        EndpointOutcome {
            endpoint,
            url: url.to_string(),
            result,
            attempts: report.attempts,
            elapsed: report.elapsed,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::mock::{MockUpstream, Reply};

    const METRICS: &str = r#"[{"title": "Нийт экспорт", "value": 14671.72, "yoy_pct": -4.42}]"#;
    const TIMELINE: &str = r#"{"products": [{"code": "2701"}], "monthly": [{"year": 2025, "month": 9, "2701": "1234.5"}]}"#;
    const VALUE: &str = r#"{"yearLabel": "2025", "exportTotal": 999, "products": [{"code": "2701", "name": "Нүүрс"}], "monthly": [{"year": 2025, "2701": 42}]}"#;
    const TOTAL: &str = r#"{"export_this_year": "14,671.7", "yoy_pct": -4.42}"#;
    const EXCHANGE: &str = r#"{"commodities": [
        {"key": "coal", "name": "Coal", "total_scaled": 2, "unit_scaled": "million tons"},
        {"key": "copper", "name": "Copper", "total_scaled": 500, "unit_scaled": "thousand tons"}
    ]}"#;
    const COAL: &str = r#"{"date": "2025-10-14", "items": [{"name": "Coke", "latest": 1200, "prev_year": 1300, "yoy_pct": -7.7}]}"#;

    fn routes(overrides: Vec<(&'static str, Reply)>) -> Vec<(&'static str, Reply)> {
        let mut routes = vec![
            ("/dashboard/metrics", Reply::json(200, METRICS)),
            ("/dashboard/export/products-timeline", Reply::json(200, TIMELINE)),
            ("/dashboard/export/products-value-monthly", Reply::json(200, VALUE)),
            ("/dashboard/export/total", Reply::json(200, TOTAL)),
            ("/dashboard/exchange/timeline", Reply::json(200, EXCHANGE)),
            ("/dashboard/coal-cny/latest", Reply::json(200, COAL)),
        ];
        for (path, reply) in overrides {
            if let Some(slot) = routes.iter_mut().find(|(p, _)| *p == path) {
                slot.1 = reply;
            }
        }
        routes
    }

    fn aggregator(upstream: &MockUpstream, timeout_ms: u64, retries: u8) -> Aggregator {
        let config = DashboardConfig::default()
            .with_base_url(upstream.base().as_str())
            .with_timeout(Duration::from_millis(timeout_ms))
            .with_retries(retries)
            .with_retry_delay(Duration::from_millis(10));
        Aggregator::new(config).unwrap()
    }

    fn status_of<'a>(view: &'a DashboardView, endpoint: Endpoint) -> &'a EndpointDiagnostic {
        view.debug_info
            .as_ref()
            .unwrap()
            .endpoints
            .iter()
            .find(|entry| entry.endpoint == endpoint.name())
            .unwrap()
    }

    #[tokio::test]
    async fn assembles_every_section() {
        let upstream = MockUpstream::start(routes(vec![]));
        let view = aggregator(&upstream, 2_000, 0).get_dashboard_view(false).await;

        let metrics = view.metrics.as_ref().unwrap();
        assert!((metrics[0].relative_change + 0.0442).abs() < 1e-12);
        assert_eq!(view.monthly_series.len(), 1);
        assert_eq!(view.monthly_series[0].count, 1235);
        assert_eq!(view.value_pie.year_label, "2025");
        assert_eq!(view.value_pie.slices[0].value, 42.0);
        // The dedicated endpoint wins over the embedded total.
        assert_eq!(view.value_pie.export_total, Some(14671.7));
        let shares = view.exchange_shares.as_ref().unwrap();
        assert!((shares[0].share - 0.8).abs() < 1e-9);
        assert_eq!(view.coal_latest.as_ref().unwrap().items.len(), 1);
        assert!(view.debug_info.is_none());
    }

    #[tokio::test]
    async fn one_failure_leaves_other_sections_intact() {
        let upstream = MockUpstream::start(routes(vec![(
            "/dashboard/metrics",
            Reply::raw(500, "Internal Server Error"),
        )]));
        let view = aggregator(&upstream, 2_000, 0).get_dashboard_view(true).await;

        assert!(view.metrics.is_none());
        assert!(!view.monthly_series.is_empty());
        assert!(!view.value_pie.slices.is_empty());
        assert!(view.value_pie.export_total.is_some());
        assert!(view.exchange_shares.is_some());
        assert!(view.coal_latest.is_some());

        let metrics = status_of(&view, Endpoint::Metrics);
        assert!(!metrics.ok);
        assert_eq!(metrics.status, "http_error");
        assert!(metrics.error.as_deref().unwrap().contains("500"));
        assert_eq!(status_of(&view, Endpoint::CoalLatest).status, "success");
    }

    #[tokio::test]
    async fn repeated_runs_never_time_out_healthy_endpoints() {
        let upstream = MockUpstream::start(routes(vec![(
            "/dashboard/metrics",
            Reply::raw(500, "Internal Server Error"),
        )]));
        let aggregator = aggregator(&upstream, 2_000, 0);

        for round in 0..20 {
            let view = aggregator.get_dashboard_view(true).await;
            let debug = view.debug_info.as_ref().unwrap();
            for entry in &debug.endpoints {
                let expected = if entry.endpoint == Endpoint::Metrics.name() {
                    "http_error"
                } else {
                    "success"
                };
                assert_eq!(entry.status, expected, "round {round}: {}", entry.endpoint);
            }
        }
        assert_eq!(upstream.hits("/dashboard/metrics"), 20);
        assert_eq!(upstream.total_hits(), 120);
    }

    #[tokio::test]
    async fn missing_base_url_makes_no_calls() {
        let upstream = MockUpstream::start(routes(vec![]));
        let aggregator = Aggregator::new(DashboardConfig::default()).unwrap();

        let view = aggregator.get_dashboard_view(true).await;
        assert_eq!(view, DashboardView::default());
        assert_eq!(upstream.total_hits(), 0);
    }

    #[tokio::test]
    async fn slow_endpoint_times_out_alone() {
        let upstream = MockUpstream::start(routes(vec![("/dashboard/coal-cny/latest", Reply::Hang)]));
        let started = Instant::now();
        let view = aggregator(&upstream, 300, 0).get_dashboard_view(true).await;

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(view.coal_latest.is_none());
        assert!(view.metrics.is_some());
        assert!(view.exchange_shares.is_some());
        assert_eq!(status_of(&view, Endpoint::CoalLatest).status, "timeout");
        assert_eq!(status_of(&view, Endpoint::Metrics).status, "success");
    }

    #[tokio::test]
    async fn calls_run_concurrently() {
        let hang_everything = [
            "/dashboard/metrics",
            "/dashboard/export/products-timeline",
            "/dashboard/export/products-value-monthly",
            "/dashboard/export/total",
            "/dashboard/exchange/timeline",
            "/dashboard/coal-cny/latest",
        ]
        .into_iter()
        .map(|path| (path, Reply::Hang))
        .collect();
        let upstream = MockUpstream::start(routes(hang_everything));
        let started = Instant::now();
        let view = aggregator(&upstream, 400, 0).get_dashboard_view(true).await;

        // Six sequential timeouts would take 2.4s.
        assert!(started.elapsed() < Duration::from_millis(1_500));
        assert!(view.is_empty());
        let debug = view.debug_info.unwrap();
        assert!(debug.endpoints.iter().all(|entry| entry.status == "timeout"));
    }

    #[tokio::test]
    async fn distinct_failure_labels() {
        let upstream = MockUpstream::start(routes(vec![
            ("/dashboard/metrics", Reply::raw(200, "<html>maintenance</html>")),
            ("/dashboard/coal-cny/latest", Reply::json(200, "[1, 2, 3]")),
            ("/dashboard/export/total", Reply::raw(404, "missing")),
        ]));
        let view = aggregator(&upstream, 2_000, 1).get_dashboard_view(true).await;

        assert_eq!(status_of(&view, Endpoint::Metrics).status, "parse_error");
        let coal = status_of(&view, Endpoint::CoalLatest);
        assert_eq!(coal.status, "parse_error");
        assert!(coal.error.as_deref().unwrap().contains("unexpected payload shape"));
        let total = status_of(&view, Endpoint::ExportTotal);
        assert_eq!(total.status, "http_error");
        assert_eq!(total.attempts, 1);
    }

    #[tokio::test]
    async fn embedded_export_total_fills_in_when_total_call_fails() {
        let upstream = MockUpstream::start(routes(vec![(
            "/dashboard/export/total",
            Reply::raw(502, "bad gateway"),
        )]));
        let view = aggregator(&upstream, 2_000, 0).get_dashboard_view(false).await;
        assert_eq!(view.value_pie.export_total, Some(999.0));
    }

    #[tokio::test]
    async fn retry_recovers_from_a_single_timeout() {
        let upstream = MockUpstream::start(routes(vec![(
            "/dashboard/export/total",
            Reply::HangOnce(TOTAL.to_string()),
        )]));
        let view = aggregator(&upstream, 300, 1).get_dashboard_view(true).await;

        assert_eq!(view.value_pie.export_total, Some(14671.7));
        let total = status_of(&view, Endpoint::ExportTotal);
        assert!(total.ok);
        assert_eq!(total.attempts, 2);
    }

    #[tokio::test]
    #[should_panic(expected = "builder bug")]
    async fn builder_panics_propagate() {
        let upstream = MockUpstream::start(routes(vec![]));
        let aggregator = aggregator(&upstream, 2_000, 0);
        let base = upstream.base().clone();
        let _ = aggregator
            .call(&base, Endpoint::Metrics, |_payload| -> Result<(), ShapeError> {
                panic!("builder bug")
            })
            .await;
    }
}
