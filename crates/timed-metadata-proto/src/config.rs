use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path prefix every gateway route hangs off (`/metadata`, `/metadata/send`, ...).
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON table on disk, rewritten after every mutation.
    #[default]
    File,
    /// Process-local table, lost on exit.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_table_path")]
    pub path: PathBuf,
}

/// A channel served by the local control backend when no endpoint is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelSeed {
    pub arn: String,
    pub name: String,
    #[serde(default = "default_latency_mode")]
    pub latency_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Base URL of the streaming control API. When unset the gateway serves
    /// `channels` from config and keeps dispatched payloads in memory.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_control_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_notification_timeout_secs")]
    pub notification_timeout_secs: u64,
    #[serde(default = "default_max_notifications")]
    pub max_notifications: usize,
    /// Raw byte cap the editor enforces while typing.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            base_path: default_base_path(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_table_path(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_control_timeout_secs(),
            channels: default_channels(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            notification_timeout_secs: default_notification_timeout_secs(),
            max_notifications: default_max_notifications(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_base_path() -> String {
    "/metadata".to_string()
}

fn default_table_path() -> PathBuf {
    platform::data_dir().join("metadatas.json")
}

fn default_latency_mode() -> String {
    "LOW".to_string()
}

fn default_control_timeout_secs() -> u64 {
    10
}

fn default_channels() -> Vec<ChannelSeed> {
    vec![ChannelSeed {
        arn: "arn:aws:ivs:us-west-2:000000000000:channel/demo".to_string(),
        name: "demo".to_string(),
        latency_mode: default_latency_mode(),
    }]
}

fn default_api_url() -> String {
    format!(
        "http://{}:{}{}",
        default_bind_address(),
        default_port(),
        default_base_path()
    )
}

fn default_notification_timeout_secs() -> u64 {
    6
}

fn default_max_notifications() -> usize {
    5
}

fn default_max_payload_bytes() -> usize {
    1000
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        match std::env::var_os(platform::CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => platform::config_dir().join("config.toml"),
        }
    }

    /// Gateway URL the console talks to, honouring `TIMED_METADATA_API`.
    pub fn api_url(&self) -> String {
        std::env::var(platform::API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.console.api_url.clone())
    }
}

/// Joins `base` and `suffix` with exactly one slash between them.
pub fn join_url(base: &str, suffix: &str) -> String {
    let base = base.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');
    if suffix.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, suffix)
    }
}
