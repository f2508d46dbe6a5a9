mod control;
mod gateway;
mod http;
mod store;

use std::sync::Arc;
use std::time::Duration;

use timed_metadata_proto::config::{Config, StoreBackend};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::control::{HttpStreamControl, LocalControl, StreamControl};
use crate::gateway::Gateways;
use crate::store::{FileStore, MemoryStore, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr and to a file in the data dir
    let data_dir = timed_metadata_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("api.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,timed_metadata_api=debug")
            }),
        )
        .init();

    info!("Log file: {:?}", log_path);

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    let store: Arc<dyn RecordStore> = match config.store.backend {
        StoreBackend::File => Arc::new(FileStore::open(&config.store.path).await?),
        StoreBackend::Memory => {
            info!("Record table is in-memory; records are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let control: Arc<dyn StreamControl> = match &config.control.endpoint {
        Some(endpoint) => {
            info!("Streaming control API: {}", endpoint);
            Arc::new(HttpStreamControl::new(
                endpoint.clone(),
                Duration::from_secs(config.control.timeout_secs),
            )?)
        }
        None => {
            info!(
                "No control endpoint configured; serving {} local channel(s)",
                config.control.channels.len()
            );
            Arc::new(LocalControl::new(config.control.channels.clone()))
        }
    };

    let gateways = Gateways::new(store, control);
    http::serve(&config.http, gateways).await
}
