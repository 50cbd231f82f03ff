use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use campus_api::services::UserService;
use campus_api::sheets::CsvSheetStore;
use campus_api::store::Store;
use campus_api::{app, config, AppState};

#[derive(Parser, Debug)]
#[command(name = "campus-api", version, about = "School administration backend")]
struct Args {
    /// Port to listen on; overrides CAMPUS_PORT and the config default.
    #[arg(long)]
    port: Option<u16>,

    /// Snapshot directory for the document store; overrides CAMPUS_DATA_DIR.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, CAMPUS_PORT, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Campus API in {:?} mode", config.environment);

    let data_dir = args.data_dir.or_else(|| {
        let dir = &config.server.data_dir;
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    });
    let store = Arc::new(Store::open(data_dir)?);
    let state = AppState::new(
        store.clone(),
        Arc::new(CsvSheetStore::new(&config.sheets.exports_dir)),
    );

    // Make sure the principal account exists before taking traffic.
    UserService::new(store).seed_super_admin().await;

    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Campus API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server")?;

    Ok(())
}
