use anyhow::{Context, Result};
use donation_verifier::{
    client::{ChainSubmitter, DonationStore, HttpChainSubmitter, HttpDonationStore},
    config::Config,
    handlers::{router, AppState},
    services::{ExplorerLinkResolver, StatsService, VerificationOrchestrator},
};
use reqwest::Url;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting donation verifier v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let store: Arc<dyn DonationStore> = Arc::new(HttpDonationStore::new(
        http.clone(),
        Url::parse(&config.store_api_url).context("STORE_API_URL is not a valid URL")?,
        config.retry_policy(),
    ));
    let chain: Arc<dyn ChainSubmitter> = Arc::new(HttpChainSubmitter::new(
        http,
        Url::parse(&config.chain_service_url).context("CHAIN_SERVICE_URL is not a valid URL")?,
    ));

    let stats = Arc::new(StatsService::new(store.clone(), config.stats_cache_ttl));
    let orchestrator = Arc::new(
        VerificationOrchestrator::new(store.clone(), chain)
            .with_persist_retry(config.retry_policy())
            .with_stats(stats.clone()),
    );

    let state = AppState {
        store,
        orchestrator,
        stats,
        explorer: ExplorerLinkResolver::new(config.default_network()),
        network: config.explorer_network.clone(),
        admin_token: config.admin_token.clone(),
        verify_timeout: config.verify_timeout,
        started_at: Instant::now(),
    };

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Store API: {}", config.store_api_url);
    tracing::info!("Chain service: {}", config.chain_service_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down gracefully...");
}
