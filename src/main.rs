use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autoblog::ai::ArticleGenerator;
use autoblog::api::{self, AppState};
use autoblog::config::Config;
use autoblog::db::ArticleStore;
use autoblog::scheduler::ArticleJob;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autoblog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Configuration loaded (provider: {})", config.ai_provider);
    if config.api_key.is_none() {
        tracing::warn!("API_KEY is not set; POST /articles/generate is open to anyone");
    }

    // Initialize database
    let store = ArticleStore::open(&config.db_path).await?;
    tracing::info!("Database ready at {}", config.db_path);

    let generator = Arc::new(ArticleGenerator::from_config(&config));

    // Seed and daily schedule run in the background so the listener starts immediately
    let job = ArticleJob::new(store.clone(), Arc::clone(&generator));
    let seed_job = job.clone();
    let seed_minimum = config.seed_minimum;
    tokio::spawn(async move {
        if let Err(e) = seed_job.seed(seed_minimum).await {
            tracing::error!("Failed to seed initial articles: {}", e);
        }
    });
    tokio::spawn(job.run_daily());

    // Build router
    let state = AppState::new(store, generator, &config)?;
    let app = api::router(state);

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Backend listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
