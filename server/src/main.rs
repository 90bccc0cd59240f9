use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use market_relay::config::{generate_config_template, Cli, Config, StorageBackend};
use market_relay::db::SqliteStore;
use market_relay::i18n::Localizer;
use market_relay::routes;
use market_relay::state::AppState;
use market_relay::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Handle --generate-config: print template and exit
    if cli.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load(&cli)?;

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("market_relay=info"));
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }

    tracing::info!("Market relay v{} starting", env!("CARGO_PKG_VERSION"));

    let languages = config.language_set();
    tracing::info!(
        fallback = %languages.fallback(),
        languages = ?languages.iter().collect::<Vec<_>>(),
        "Supported chat languages"
    );
    let localizer = Localizer::with_defaults(languages);

    let app_state = match config.storage {
        StorageBackend::Sqlite => {
            let store = Arc::new(SqliteStore::open(&config.data_dir)?);
            AppState::with_store(store, localizer)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, chat history is lost on restart");
            AppState::with_store(Arc::new(MemoryStore::new()), localizer)
        }
    }
    .with_keepalive(config.keepalive());

    let app = routes::build_router(app_state);

    // Bind and serve
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Market relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
