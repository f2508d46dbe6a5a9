mod action;
mod api;
mod app;
mod dashboard;
mod state;
mod theme;
mod widgets;

use std::sync::Arc;

use timed_metadata_proto::config::Config;

use crate::api::HttpApi;
use crate::dashboard::{Dashboard, DashboardSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = timed_metadata_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("console.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // The TUI owns the terminal, so logs only go to the file. RUST_LOG
    // overrides; HTTP client internals are kept quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("timed-metadata console log: {}", log_path.display());
    tracing::info!("console starting…");

    let config = Config::load().unwrap_or_default();
    let api_url = config.api_url();

    let api = HttpApi::new(api_url.clone())?;
    let (dashboard, events) = Dashboard::new(Arc::new(api), DashboardSettings::from(&config.console));

    app::App::new(dashboard, api_url).run(events).await
}
