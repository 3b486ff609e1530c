use crate::bootstrap::AppState;
use crate::callable;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

async fn health_check() -> &'static str {
    "OK"
}

/// Routes for the callable functions plus health.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(callable::generate_my_house))
        .route("/generate_my_house", post(callable::generate_my_house))
        .route("/health", get(health_check))
        .with_state(state)
}

#[cfg(feature = "prometheus")]
fn with_metrics(router: Router) -> Result<Router> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {e}"))?;
    Ok(router.route("/metrics", get(move || std::future::ready(handle.render()))))
}

#[cfg(not(feature = "prometheus"))]
fn with_metrics(router: Router) -> Result<Router> {
    Ok(router)
}

/// Serves until `shutdown` resolves, letting in-flight requests finish.
pub async fn run_server<F>(state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.listen_addr();
    let app = with_metrics(router(state))?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
