use anyhow::{Context, Result};
use clap::Parser;
use lib::adapters::llm::RuntimeSelector;
use lib::adapters::tryon::HttpTryOnProvider;
use lib::config::{ApiKeys, Args, SharedConfig};
use lib::server::{build_router, AppState};
use lib::store::{LayeredStore, RecordStore, SqliteStore};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    let generated_root = args.data_dir.join("generated_code");
    std::fs::create_dir_all(&generated_root).with_context(|| {
        format!(
            "Failed to create generated code directory at {}",
            generated_root.display()
        )
    })?;

    // The durable layer is advisory; if sqlite is unavailable the service
    // keeps running against the in-memory store alone.
    let durable = match SqliteStore::open(args.data_dir.join("appforge.sqlite3")) {
        Ok(store) => Some(Arc::new(store) as Arc<dyn RecordStore>),
        Err(err) => {
            error!("Failed to open sqlite store, continuing in-memory only: {err:#}");
            None
        }
    };

    let config = SharedConfig::new(ApiKeys::from_env());
    let tryon_url = config.snapshot().tryon_url.clone();
    let state = AppState {
        selector: Arc::new(RuntimeSelector::new(config.clone())),
        tryon: Arc::new(HttpTryOnProvider::new(tryon_url)),
        store: Arc::new(LayeredStore::new(durable)),
        config,
        generated_root,
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid listen address")?;
    info!("appforge backend listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
