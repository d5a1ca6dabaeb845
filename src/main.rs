use anyhow::Context;
use contact_relay::{
    AppState,
    apex::config::Settings,
    notifications::{schemas::ProviderKind, transport::ReqwestTransport},
    router,
};
use dotenv::dotenv;
use std::{
    env::var,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env();
    match ProviderKind::parse(settings.mail_provider.as_deref()) {
        Ok(provider) => info!(provider = provider.as_str(), "mail provider selected"),
        Err(error) => warn!(%error, "mail provider misconfigured; requests will fail"),
    }

    let domain = var("DOMAIN").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .context("Failed to parse PORT")?;

    let addr = SocketAddr::from((
        domain
            .parse::<IpAddr>()
            .context("Failed to parse DOMAIN")?,
        port,
    ));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let state = AppState::new(settings, Arc::new(ReqwestTransport::new()));

    info!(%addr, "contact relay listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
