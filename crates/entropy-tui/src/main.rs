//! Entropy TUI entry point.

use std::{error::Error, fs::File, sync::Mutex};

use clap::Parser;
use entropy_app::{App, Runtime, Settings};
use entropy_store::{ChangeFeed, MemoryStore, RedbStore, Store};
use entropy_tui::{Args, LocalBackend, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log_file = File::create(args.log_path())?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
        .with(filter)
        .init();

    let settings = args.settings();
    tracing::info!(version = %settings.version, store = ?settings.store_path, "Entropy starting");

    match settings.store_path.clone() {
        Some(path) => {
            let store = RedbStore::open(path)?;
            run(store, settings, args.feed_capacity).await
        },
        None => run(MemoryStore::new(), settings, args.feed_capacity).await,
    }
}

async fn run<S: Store>(store: S, settings: Settings, feed_capacity: usize) -> Result<(), Box<dyn Error>> {
    let feed = ChangeFeed::with_capacity(store.clone(), feed_capacity);
    let backend = LocalBackend::new(feed.clone());
    let driver = TerminalDriver::new()?;
    let app = App::new(store, settings);

    Runtime::new(driver, backend, app, feed.subscribe()).run().await?;

    tracing::info!("Entropy stopped");
    Ok(())
}
