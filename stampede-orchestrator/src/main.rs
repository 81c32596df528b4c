use anyhow::Context;
use stampede_orchestrator::{api, config::Config, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stampede_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Stampede Orchestrator...");

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;

    config
        .prepare_directories()
        .await
        .context("Failed to create scripts/results directories")?;

    tracing::info!("Scripts directory: {}", config.scripts_dir.display());
    tracing::info!("Results directory: {}", config.results_dir.display());
    tracing::info!("Runner command: {}", config.runner_command);

    let addr = config.bind_addr.clone();
    let app = api::create_router(AppState::new(config));

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Orchestrator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
