//! Streaming control API client: channel listing and the metadata sideband.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use timed_metadata_proto::config::{join_url, ChannelSeed};

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("control API returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid control API response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait StreamControl: Send + Sync {
    /// The raw channel listing, `{"channels": [...]}`.
    async fn list_channels(&self) -> Result<Value, ControlError>;

    /// Injects `metadata` into the live stream of `channel_arn`.
    async fn put_metadata(&self, channel_arn: &str, metadata: &str) -> Result<Value, ControlError>;
}

// ── HTTP control API ──────────────────────────────────────────────────────────

/// Talks to an IVS-style REST control plane (`POST /ListChannels`,
/// `POST /PutMetadata`).
pub struct HttpStreamControl {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpStreamControl {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ControlError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    async fn call(&self, operation: &str, body: Value) -> Result<Value, ControlError> {
        let url = join_url(&self.endpoint, operation);
        debug!("control: POST {}", url);
        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(ControlError::Rejected {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(json!({}));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl StreamControl for HttpStreamControl {
    async fn list_channels(&self) -> Result<Value, ControlError> {
        self.call("ListChannels", json!({})).await
    }

    async fn put_metadata(&self, channel_arn: &str, metadata: &str) -> Result<Value, ControlError> {
        self.call(
            "PutMetadata",
            json!({ "channelArn": channel_arn, "metadata": metadata }),
        )
        .await
    }
}

// ── Local control plane ───────────────────────────────────────────────────────

/// Serves the channels declared in config and logs every dispatched payload
/// instead of forwarding it. Test builds also keep the payloads.
pub struct LocalControl {
    channels: Vec<ChannelSeed>,
    #[cfg(test)]
    dispatched: tokio::sync::Mutex<Vec<(String, String)>>,
}

impl LocalControl {
    pub fn new(channels: Vec<ChannelSeed>) -> Self {
        Self {
            channels,
            #[cfg(test)]
            dispatched: Default::default(),
        }
    }

    /// `(channel_arn, metadata)` pairs in dispatch order.
    #[cfg(test)]
    pub async fn dispatched(&self) -> Vec<(String, String)> {
        self.dispatched.lock().await.clone()
    }
}

#[async_trait]
impl StreamControl for LocalControl {
    async fn list_channels(&self) -> Result<Value, ControlError> {
        let channels: Vec<Value> = self
            .channels
            .iter()
            .map(|c| {
                json!({
                    "arn": c.arn,
                    "name": c.name,
                    "latencyMode": c.latency_mode,
                    "authorized": false,
                    "recordingConfigurationArn": "",
                    "tags": {},
                })
            })
            .collect();
        Ok(json!({ "channels": channels }))
    }

    async fn put_metadata(&self, channel_arn: &str, metadata: &str) -> Result<Value, ControlError> {
        if !self.channels.iter().any(|c| c.arn == channel_arn) {
            return Err(ControlError::Rejected {
                status: 404,
                body: format!("ResourceNotFoundException: channel {} not found", channel_arn),
            });
        }
        info!("control: metadata injected into {} ({} bytes)", channel_arn, metadata.len());
        #[cfg(test)]
        self.dispatched
            .lock()
            .await
            .push((channel_arn.to_string(), metadata.to_string()));
        Ok(json!({}))
    }
}
