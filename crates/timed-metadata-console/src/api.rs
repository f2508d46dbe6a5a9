//! Gateway client used by the dashboard.
//!
//! `MetadataApi` is the seam the dashboard is written against; `HttpApi` is
//! the reqwest implementation that talks to a running gateway.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use timed_metadata_proto::config::join_url;
use timed_metadata_proto::protocol::{
    ChannelList, CreateRequest, ErrorBody, PublicRecord, SendRequest, StoredRecord, UpdateRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("gateway answered {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
        kind: Option<String>,
        dispatched: Option<bool>,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// True when a send failed after the payload had already reached the
    /// channel.
    pub fn was_dispatched(&self) -> bool {
        matches!(
            self,
            ApiError::Rejected {
                dispatched: Some(true),
                ..
            }
        )
    }
}

#[async_trait]
pub trait MetadataApi: Send + Sync + 'static {
    async fn list_records(&self) -> Result<Vec<PublicRecord>, ApiError>;

    /// `None` when the gateway answers `{}` (no record with this id).
    async fn get_record(&self, id: &str) -> Result<Option<PublicRecord>, ApiError>;

    async fn create_record(&self, req: CreateRequest) -> Result<StoredRecord, ApiError>;

    async fn update_record(&self, req: UpdateRequest) -> Result<PublicRecord, ApiError>;

    async fn delete_record(&self, id: &str) -> Result<(), ApiError>;

    async fn list_channels(&self) -> Result<ChannelList, ApiError>;

    async fn send_metadata(&self, req: SendRequest) -> Result<(), ApiError>;
}

pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, suffix: &str) -> String {
        join_url(&self.base_url, suffix)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        suffix: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(suffix);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        read(response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        suffix: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.url(suffix);
        debug!("GET {} {:?}", url, query);
        let response = self.client.get(&url).query(query).send().await?;
        read(response).await
    }
}

#[async_trait]
impl MetadataApi for HttpApi {
    async fn list_records(&self) -> Result<Vec<PublicRecord>, ApiError> {
        self.get("", &[]).await
    }

    async fn get_record(&self, id: &str) -> Result<Option<PublicRecord>, ApiError> {
        let value: serde_json::Value = self.get("", &[("id", id)]).await?;
        record_or_none(value)
    }

    async fn create_record(&self, req: CreateRequest) -> Result<StoredRecord, ApiError> {
        self.post("", &req).await
    }

    async fn update_record(&self, req: UpdateRequest) -> Result<PublicRecord, ApiError> {
        self.post("update", &req).await
    }

    async fn delete_record(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self.get("delete", &[("id", id)]).await?;
        Ok(())
    }

    async fn list_channels(&self) -> Result<ChannelList, ApiError> {
        self.get("channels", &[]).await
    }

    async fn send_metadata(&self, req: SendRequest) -> Result<(), ApiError> {
        let _: serde_json::Value = self.post("send", &req).await?;
        Ok(())
    }
}

async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    decode(status, &bytes)
}

/// Maps a gateway response to either the decoded body or a `Rejected` error
/// carrying the gateway's error body when it has one.
fn decode<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ApiError> {
    if (200..300).contains(&status) {
        return Ok(serde_json::from_slice(body)?);
    }
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) => Err(ApiError::Rejected {
            status,
            message: err.message,
            kind: Some(err.kind),
            dispatched: err.dispatched,
        }),
        Err(_) => Err(ApiError::Rejected {
            status,
            message: String::from_utf8_lossy(body).into_owned(),
            kind: None,
            dispatched: None,
        }),
    }
}

fn record_or_none(value: serde_json::Value) -> Result<Option<PublicRecord>, ApiError> {
    match &value {
        serde_json::Value::Object(map) if map.is_empty() => Ok(None),
        _ => Ok(Some(serde_json::from_value(value)?)),
    }
}
