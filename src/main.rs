//! SAAP sync - serves the planning workbook to the dashboard

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use saap_sync::{
    config::{Args, Deployment},
    logging,
    server::{self, AppState},
    source::{Backend, HttpFetcher, SourceLoader},
    store::RecordStore,
    sync::{SyncHub, Synchronizer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let backend = match args.deployment() {
        Deployment::LocalFile(path) => Backend::LocalFile(path),
        Deployment::Remote { url, key } => Backend::Remote {
            fetcher: Arc::new(HttpFetcher::new(url, args.remote_timeout())),
            key,
            ttl: args.remote_ttl(),
        },
        Deployment::Empty => Backend::Empty,
    };

    info!("======================================");
    info!("  SAAP sync");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Source: {} {}", backend.kind(), backend.location().unwrap_or_default());
    info!("Layout: {:?}", args.layout);
    info!("Identity: {:?}", args.identity());
    info!("======================================");

    let loader = Arc::new(SourceLoader::new(backend, args.decoder()));
    let sync = Arc::new(Synchronizer::new(
        Arc::new(RecordStore::new()),
        loader,
        Arc::new(SyncHub::new()),
    ));
    let state = Arc::new(AppState::new(args, sync));

    server::run(state).await?;
    Ok(())
}
