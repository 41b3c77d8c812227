use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use wardrobe_api::media::MediaStore;
use wardrobe_api::store::{EntityStore, MemoryStore, PgStore};
use wardrobe_api::{app, config, AppState};

#[derive(Parser)]
#[command(name = "wardrobe-api", about = "Wardrobe API server", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen port (overrides WARDROBE_PORT / config default)
        #[arg(long)]
        port: Option<u16>,
        /// Serve from the in-memory store instead of Postgres
        #[arg(long)]
        memory: bool,
    },
    /// Apply the database schema and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = config::config();
    info!("Starting Wardrobe API in {:?} mode", config.environment);

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve {
        port: None,
        memory: false,
    }) {
        Command::Serve { port, memory } => serve(port, memory).await,
        Command::Migrate => migrate().await,
    }
}

async fn connect_pg() -> anyhow::Result<PgStore> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let store = PgStore::connect(&url, config::config().database.max_connections)
        .await
        .context("failed to connect to database")?;
    Ok(store)
}

async fn serve(port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    let config = config::config();

    let store: Arc<dyn EntityStore> = if memory {
        warn!("using the in-memory store; data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let store = connect_pg().await?;
        store.migrate().await?;
        Arc::new(store)
    };

    let state = AppState {
        store,
        media: MediaStore::new(config.storage.media_root.as_str()),
    };

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("wardrobe-api listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let store = connect_pg().await?;
    store.migrate().await?;
    info!("migrations applied");
    Ok(())
}
