use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use cdp_adapter::metrics as cdp_metrics;
use disposition_flow::metrics as flow_metrics;
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{error, info};

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static REGISTER_ONCE: OnceCell<()> = OnceCell::new();

pub fn register_metrics() {
    REGISTER_ONCE.get_or_init(|| {
        let registry = global_registry();
        flow_metrics::register_metrics(registry);
        cdp_metrics::register_metrics(registry);
    });
}

pub fn spawn_metrics_server(port: u16) -> Option<JoinHandle<()>> {
    if port == 0 {
        return None;
    }

    register_metrics();
    let registry = Arc::new(global_registry().clone());
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(%addr, "metrics server listening");
    Some(tokio::spawn(async move {
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(err) = axum::serve(listener, app.into_make_service()).await {
                    error!(?err, "metrics server exited with error");
                }
            }
            Err(err) => {
                error!(?err, "failed to bind metrics listener");
            }
        }
    }))
}

async fn metrics_handler(State(registry): State<Arc<Registry>>) -> Response {
    render(&registry)
}

/// Encode `registry` in the Prometheus text format
pub fn render(registry: &Registry) -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&registry.gather(), &mut buffer) {
        error!(?err, "failed to encode prometheus metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response();
    }

    match HeaderValue::from_str(encoder.format_type()) {
        Ok(value) => ([(header::CONTENT_TYPE, value)], buffer).into_response(),
        Err(err) => {
            error!(?err, "failed to build content-type header");
            (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response()
        }
    }
}

pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_port_spawns_nothing() {
        assert!(spawn_metrics_server(0).is_none());
    }

    #[test]
    fn test_registry_carries_disposition_counters() {
        register_metrics();
        flow_metrics::record_outcome("escalated");
        let names: Vec<String> = global_registry()
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"firco_disposition_outcomes_total".to_string()));
    }
}
