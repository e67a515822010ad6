mod config;
mod error;
mod form;
mod render;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use roas_report_core::secrets::{
    EnvSecretStore, LayeredSecretStore, MemorySecretStore, SecretStore,
};
use roas_report_core::RoasReporter;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::DashboardConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = DashboardConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level, config.log_json);

    // Placeholders are read after `from_env` has loaded `.env`.
    let env_store = EnvSecretStore::from_env();
    let defaults = env_store.credentials().clone();
    info!(
        meta = defaults.meta.is_some(),
        google = defaults.google.is_some(),
        shopify = defaults.shopify.is_some(),
        "default credentials loaded"
    );

    let layers: Vec<Arc<dyn SecretStore>> =
        vec![Arc::new(MemorySecretStore::new()), Arc::new(env_store)];
    let secrets = LayeredSecretStore::new(layers);
    let reporter = RoasReporter::with_secret_store(config.settings(), Arc::new(secrets))
        .context("invalid fetch settings")?;

    let state = Arc::new(AppState { reporter, defaults });
    let app = routes::router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "dashboard listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    if json {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
