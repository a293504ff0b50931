//! # Prometheus Metrics
//!
//! Installs a process-global Prometheus recorder and records one
//! counter and one histogram per request. `msez-api`'s own
//! `middleware/metrics.rs` only hand-rolls atomic request/error
//! counters despite declaring `metrics`/`metrics-exporter-prometheus`
//! as dependencies; this module wires up the crates the teacher's
//! `Cargo.toml` already names.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder once at startup and return a
/// handle that can render the current snapshot as exposition text.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("installing the prometheus recorder should only ever happen once per process")
}

/// Tower/Axum middleware recording `http_requests_total` and
/// `http_request_duration_seconds` per route, labeled by method, path
/// template, and status code.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(elapsed);

    response
}

/// `GET /metrics` — Prometheus exposition format.
pub async fn render() -> String {
    prometheus_handle().render()
}

fn prometheus_handle() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get()
        .cloned()
        .expect("install_recorder must run before serving /metrics")
}

static PROMETHEUS_HANDLE: std::sync::OnceLock<PrometheusHandle> = std::sync::OnceLock::new();

/// Called once from `main` right after [`install_recorder`], so the
/// `/metrics` handler (which has no other way to reach the handle
/// through Axum's `State`, since [`AppState`] is domain state rather
/// than infra state) can render it.
pub fn set_handle(handle: PrometheusHandle) {
    let _ = PROMETHEUS_HANDLE.set(handle);
}
