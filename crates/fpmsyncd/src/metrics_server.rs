//! HTTP metrics endpoint for Prometheus scraping
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-6: Audit Record Review - Metrics endpoint for analysis
//! - SI-4: System Monitoring - HTTP endpoint for monitoring systems
//! - SC-7: Boundary Protection - Bound to loopback by default

use crate::error::Result;
use crate::metrics::SyncMetrics;
use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Default metrics server port
pub const DEFAULT_METRICS_PORT: u16 = 9091;

/// Routes `/metrics` and `/health` over the engine's counters
pub fn metrics_router(metrics: SyncMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics)
}

/// Bind `addr` and serve metrics until the task is dropped
pub async fn start_metrics_server(addr: SocketAddr, metrics: SyncMetrics) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_metrics(listener, metrics).await
}

/// Serve metrics on an already bound listener
pub async fn serve_metrics(listener: TcpListener, metrics: SyncMetrics) -> Result<()> {
    info!(addr = %listener.local_addr()?, "Starting metrics server");
    axum::serve(listener, metrics_router(metrics)).await?;
    Ok(())
}

/// Handle /metrics endpoint - Prometheus text format
///
/// # NIST Controls
/// - AU-6: Audit Record Review - Provide metrics in Prometheus format
async fn metrics_handler(State(metrics): State<SyncMetrics>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status": "healthy"}"#,
    )
}
