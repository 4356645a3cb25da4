use anyhow::{Context, Result};
use rpgm_translator::{
    api::{self, AppState},
    config::Config,
    pipeline::Pipeline,
    runner::JobRunner,
    store::{InMemoryStatusStore, StatusStore},
    sweeper,
    translation::{GoogleWebProvider, TextTranslator},
    workspace::Workspace,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rpgm_translator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RPG Maker translator");

    let config = Config::from_env();
    info!(
        "Upload directory: {}, translation endpoint: {}",
        config.upload_dir.display(),
        config.translate_api_url
    );

    let workspace = Workspace::new(&config.upload_dir)?;
    let store: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let provider = Arc::new(GoogleWebProvider::new(client, &config.translate_api_url));
    let translator = TextTranslator::new(provider);

    let pipeline = Arc::new(Pipeline::new(
        Arc::clone(&store),
        translator,
        workspace.clone(),
    ));
    let runner = Arc::new(JobRunner::new(pipeline, config.max_concurrent_jobs));

    let mut scheduler = sweeper::start_sweeper(
        &config.sweep_schedule,
        Arc::clone(&store),
        workspace.clone(),
        config.retention(),
    )
    .await?;

    let state = AppState::new(
        runner,
        &config.default_source_language,
        config.max_upload_mb * 1024 * 1024,
    );
    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    if let Err(e) = scheduler.shutdown().await {
        warn!("Failed to stop sweeper: {}", e);
    }
    sweeper::run_sweep(store.as_ref(), &workspace, config.retention());

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
