use anyhow::{Context, Result};
use house_worker_app::{config::Config, initialize_app, logging, server, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    logging::init_logging(config.log_format)?;

    tracing::info!(
        project = ?config.project_id,
        store = ?config.store.backend,
        auth = ?config.auth,
        "Starting house-worker functions"
    );

    let app = initialize_app(config)?;
    server::run_server(app, shutdown::shutdown_signal()).await
}
