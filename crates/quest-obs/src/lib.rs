//! Observability utilities: exchange and cycle metrics

use std::net::SocketAddr;
use std::time::Duration;

use axum::{response::IntoResponse, routing::get, Router};
use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, TextEncoder};

static EXCHANGES: Lazy<IntCounterVec> = Lazy::new(|| {
    prometheus::register_int_counter_vec!("quest_exchanges_total", "Exchanges by outcome", &["outcome"]).unwrap()
});
static TTFT: Lazy<Histogram> = Lazy::new(|| {
    prometheus::register_histogram!("quest_ttft_seconds", "Time to first response byte from the agent").unwrap()
});
static EXCHANGE_TIME: Lazy<Histogram> = Lazy::new(|| {
    prometheus::register_histogram!("quest_exchange_seconds", "Agent call latency until the stream ends").unwrap()
});
static CYCLES: Lazy<IntCounter> = Lazy::new(|| {
    prometheus::register_int_counter!("quest_cycles_total", "Completed cycles over all wallets").unwrap()
});

static ENCODER: Lazy<TextEncoder> = Lazy::new(TextEncoder::new);

pub fn init() {
    let _ = &*EXCHANGES;
    let _ = &*TTFT;
    let _ = &*EXCHANGE_TIME;
    let _ = &*CYCLES;
}

pub fn record_exchange(ttft: Option<Duration>, total: Duration) {
    EXCHANGES.with_label_values(&["ok"]).inc();
    if let Some(ttft) = ttft { TTFT.observe(ttft.as_secs_f64()); }
    EXCHANGE_TIME.observe(total.as_secs_f64());
}

pub fn record_failure(outcome: &str) {
    EXCHANGES.with_label_values(&[outcome]).inc();
}

pub fn record_cycle() {
    CYCLES.inc();
}

pub fn exchanges(outcome: &str) -> u64 {
    EXCHANGES.with_label_values(&[outcome]).get()
}

pub fn cycles() -> u64 {
    CYCLES.get()
}

/// Prometheus text exposition of everything in the default registry.
pub fn gather_text() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = ENCODER.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(target: "metrics", "encode failed: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn router() -> Router {
    init();
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(metrics))
}

async fn metrics() -> impl IntoResponse {
    ([("content-type", ENCODER.format_type().to_string())], gather_text())
}

/// Serves `/metrics` in the background until the process exits.
pub async fn spawn_server(addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(target: "metrics", "metrics on http://{}/metrics", local);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router()).await {
            tracing::error!(target: "metrics", "metrics server stopped: {}", e);
        }
    });
    Ok(local)
}
