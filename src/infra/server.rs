//! JSON route in front of the aggregator (`trade_dashboard serve`).
//!
//! A fixed pool of worker threads pulls requests off one `tiny_http`
//! server, so a slow backend queues connections instead of piling up
//! threads. Aggregation runs on the tokio runtime passed in by `main`.

use std::{
    io::Cursor,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::runtime::Handle;
use tracing::{info, warn};
use url::form_urlencoded;

use super::aggregator::Aggregator;
use crate::domain::DashboardView;
use crate::util::version::version_label;

const CACHE_SHARED: &str = "s-maxage=60, stale-while-revalidate=300";
const CACHE_NONE: &str = "no-store";
/// Requests handled at once; later ones wait in the accept queue.
const WORKERS: usize = 8;

/// Status, headers and body of a response before it becomes a
/// `tiny_http::Response`.
#[derive(Debug, PartialEq)]
struct Rendered {
    status: u16,
    headers: Vec<(&'static str, &'static str)>,
    body: String,
}

impl Rendered {
    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", "application/json; charset=utf-8")],
            body,
        }
    }

    fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    #[cfg(test)]
    fn header(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let mut response =
            Response::from_data(self.body.into_bytes()).with_status_code(StatusCode(self.status));
        for (name, value) in self.headers {
            if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }
        response
    }
}

/// Serve the dashboard JSON on `addr`. Blocks the current thread.
pub fn serve(addr: &str, aggregator: Aggregator, runtime: Handle) -> Result<()> {
    let server = Server::http(addr)
        .map(Arc::new)
        .map_err(|err| anyhow::anyhow!("failed to start HTTP server on {addr}: {err}"))?;

    info!("[serve] listening on http://{addr}/api/dashboard");
    if aggregator.config().base_url.is_none() {
        warn!("[serve] no backend configured; every response will be the empty view");
    }

    let workers = spawn_workers(&server, WORKERS, move |request| {
        handle(request, &aggregator, &runtime)
    });
    for worker in workers {
        if worker.join().is_err() {
            warn!("[serve] worker thread panicked");
        }
    }

    Ok(())
}

/// Start `count` threads that each take requests from `server` until it is
/// unblocked or fails.
fn spawn_workers<H>(server: &Arc<Server>, count: usize, handler: H) -> Vec<JoinHandle<()>>
where
    H: Fn(Request) + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    (0..count.max(1))
        .map(|_| {
            let server = Arc::clone(server);
            let handler = Arc::clone(&handler);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    handler(request);
                }
            })
        })
        .collect()
}

fn handle(request: Request, aggregator: &Aggregator, runtime: &Handle) {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();

    let rendered = dispatch(&method, &url, aggregator, |debug| {
        runtime.block_on(aggregator.get_dashboard_view(debug))
    });
    let status = rendered.status;

    if let Err(err) = request.respond(rendered.into_response()) {
        warn!("[serve] failed to write response for {url}: {err}");
    }
    info!(
        "[serve] {method} {url} {status} {}ms",
        started.elapsed().as_millis()
    );
}

fn dispatch<F>(method: &Method, url: &str, aggregator: &Aggregator, load: F) -> Rendered
where
    F: FnOnce(bool) -> DashboardView,
{
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    match (method, path) {
        (&Method::Get, "/api/dashboard") => {
            let debug = wants_debug(query);
            let view = load(debug);
            let base = aggregator.config().base_url.as_ref().map(|url| url.as_str());
            render_dashboard(&view, debug, base)
        }
        (&Method::Get, "/api/health") => render_health(aggregator.config().base_url.is_some()),
        _ => not_found(),
    }
}

fn wants_debug(query: &str) -> bool {
    form_urlencoded::parse(query.as_bytes())
        .any(|(key, value)| key == "debug" && matches!(value.as_ref(), "1" | "true"))
}

fn render_dashboard(view: &DashboardView, debug: bool, base: Option<&str>) -> Rendered {
    let body = serde_json::to_value(view).and_then(|mut value| {
        if debug {
            if let Some(object) = value.as_object_mut() {
                object.insert("base".into(), base.into());
            }
        }
        serde_json::to_string(&value)
    });

    match body {
        Ok(body) => {
            let cache = if debug { CACHE_NONE } else { CACHE_SHARED };
            Rendered::json(200, body)
                .with_header("Cache-Control", cache)
                .with_header("x-dashboard", "ok")
        }
        Err(err) => {
            warn!("[serve] failed to serialize dashboard view: {err}");
            let body = serde_json::json!({ "error": "failed to render dashboard" }).to_string();
            Rendered::json(500, body)
                .with_header("Cache-Control", CACHE_NONE)
                .with_header("x-dashboard", "fail")
        }
    }
}

fn render_health(configured: bool) -> Rendered {
    let body = serde_json::json!({
        "status": "ok",
        "version": version_label(),
        "backendConfigured": configured,
    });
    Rendered::json(200, body.to_string()).with_header("Cache-Control", CACHE_NONE)
}

fn not_found() -> Rendered {
    Rendered::json(404, r#"{"error": "not found"}"#.to_string())
}
