use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use pagecache::CacheConfig;
use pagecache_observability::{init_metrics, init_tracing};
use pagecache_server::{
    config::server::ServerConfig,
    router::init_router,
    state::{init_app_state, purge_page},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "pagecache-server")]
#[command(about = "HTTP server with a response cache in front of its pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to bind, overrides SERVER_ADDR
        #[arg(short = 'a', long)]
        addr: Option<String>,
    },
    /// Remove the cached page for a request target, e.g. "/api/pages/time?x=1" (Redis backend only)
    Purge {
        /// Request target (path and optional query string)
        target: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    init_tracing()?;

    let cache_config = CacheConfig::from_env().context("Invalid cache configuration")?;

    match cli.command.unwrap_or(Commands::Serve { addr: None }) {
        Commands::Serve { addr } => serve(cache_config, addr).await,
        Commands::Purge { target } => purge(cache_config, &target).await,
    }
}

async fn serve(cache_config: CacheConfig, addr: Option<String>) -> anyhow::Result<()> {
    let addr = addr.unwrap_or_else(|| ServerConfig::from_env().addr);

    let metrics = init_metrics();
    let state = init_app_state(cache_config).await?;
    let app = init_router(state, metrics);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Server running");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn purge(cache_config: CacheConfig, target: &str) -> anyhow::Result<()> {
    let key = purge_page(&cache_config, target).await?;

    info!(cache.key = %key, "Purged cached page");
    println!("Purged {}", key);

    Ok(())
}
