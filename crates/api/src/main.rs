use std::sync::Arc;

use anyhow::Context;

use onboard_api::app::{self, services};
use onboard_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    onboard_observability::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let services = Arc::new(services::build_services(&config).await?);
    let _sweeper = services::spawn_sweeper(services.clone(), config.sweep_interval);

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
