use anyhow::Context;
use clap::Parser;
use greeter::config::Config;
use greeter::db::MeasurementStore;
use greeter::greetings::Catalog;
use greeter::{metrics, rest};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting greeter");
    info!("HTTP server: {}", config.http_addr);
    info!("Database: {}", config.database_path);

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    info!("Shutting down");
}

async fn run(config: Config) -> anyhow::Result<()> {
    metrics::init_metrics().context("error registering metrics")?;

    let store = MeasurementStore::open(&config.database_path)
        .await
        .context("error initializing database")?;

    let catalog = Catalog::embedded().context("error loading greetings")?;
    info!("Loaded {} greetings", catalog.len());

    let cors = rest::cors_layer(&config.allowed_origins).context("error configuring CORS")?;
    let app = rest::create_router(rest::AppState::new(store.clone(), catalog), cors);

    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("error binding to {}", config.http_addr))?;

    info!("HTTP server listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("error running HTTP server")?;

    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
