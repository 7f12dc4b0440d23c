use std::sync::Arc;

use baggage_core::completion::{CompletionBackend, OpenRouterClient};
use baggage_core::config::StorageBackend;
use baggage_core::db;
use baggage_core::models::RecordFilter;
use baggage_core::storage::create_store;
use baggage_core::BaggageConfig;
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use baggage_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "baggage.toml")]
    config: String,

    /// Validate configuration, probe the record store, and exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config_path = shellexpand::tilde(&args.config).into_owned();

    let config = match BaggageConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let completion = OpenRouterClient::new(config.completion.clone())?;
    if !completion.has_api_key() {
        tracing::warn!("OPENROUTER_API_KEY is not set; item checks will fail until it is");
    }

    let store = match create_store(&config.storage).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialise record store: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        if config.storage.backend == StorageBackend::Postgres {
            let pool = db::create_pool(&config.storage).await?;
            match db::health_check(&pool).await {
                Ok(v) => println!("✅ Postgres version: {}", v),
                Err(e) => {
                    println!("❌ Postgres health check failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        match &store {
            Some(store) => match store.list(&RecordFilter::new(None, Some(1), None)).await {
                Ok(_) => println!("✅ Record store reachable ({})", store.name()),
                Err(e) => {
                    println!("❌ Record store check failed: {}", e);
                    std::process::exit(1);
                }
            },
            None => println!("ℹ️  Persistence disabled"),
        }
        if completion.has_api_key() {
            println!("✅ Completion API key configured ({})", completion.name());
        } else {
            println!("❌ OPENROUTER_API_KEY is not set");
            std::process::exit(1);
        }
        return Ok(());
    }

    match &store {
        Some(store) => tracing::info!(backend = store.name(), "Persistence enabled"),
        None => tracing::warn!("Persistence disabled; responses will carry no database id"),
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let state = Arc::new(HttpState {
        completion: Arc::new(completion),
        store,
    });
    let addr = format!("{}:{}", config.http.host, config.http.port);
    http::start_http_server(state, &addr, tx.subscribe()).await?;

    Ok(())
}
