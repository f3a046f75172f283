use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use exporter_core::MetricsRenderError;
use metrics_registry::{MetricsRegistry, CONTENT_TYPE};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::error;

pub fn router(registry: Arc<MetricsRegistry>) -> Router {
    Router::new().route("/metrics", get(metrics)).with_state(registry)
}

pub async fn serve(listener: TcpListener, registry: Arc<MetricsRegistry>) -> anyhow::Result<()> {
    axum::serve(listener, router(registry)).await?;
    Ok(())
}

async fn metrics(State(registry): State<Arc<MetricsRegistry>>) -> Response {
    metrics_response(registry.render())
}

fn metrics_response(rendered: Result<String, MetricsRenderError>) -> Response {
    match rendered {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "metrics render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
