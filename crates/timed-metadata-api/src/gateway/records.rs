use std::sync::Arc;

use tracing::{info, warn};

use timed_metadata_proto::protocol::{
    required, CreateRequest, DeleteAck, PublicRecord, StoredRecord, UpdateRequest,
};

use super::GatewayError;
use crate::store::{AttributeUpdate, RecordStore};

/// CRUD façade over the record table.
#[derive(Clone)]
pub struct RecordGateway {
    store: Arc<dyn RecordStore>,
}

impl RecordGateway {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Stores a new record under a fresh id and returns it as stored.
    pub async fn create(&self, req: CreateRequest) -> Result<StoredRecord, GatewayError> {
        let (Some(channel), Some(title)) = (required(&req.channel), required(&req.title)) else {
            warn!("create: missing required field(s)");
            return Err(GatewayError::Validation(
                "Must provide channel and title".to_string(),
            ));
        };

        let item = StoredRecord {
            id: uuid::Uuid::new_v4().to_string(),
            channel: channel.to_string(),
            title: title.to_string(),
            metadata: req.metadata.unwrap_or_default(),
            created_date: Some(chrono::Utc::now().timestamp_millis().to_string()),
            sent: None,
        };
        self.store.put(item.clone()).await?;
        info!("create: stored {} on channel {}", item.id, item.channel);
        Ok(item)
    }

    /// Sets title, channel and payload; the sent marker and creation date are
    /// left alone.
    pub async fn update(&self, req: UpdateRequest) -> Result<PublicRecord, GatewayError> {
        let (Some(id), Some(channel), Some(title)) = (
            required(&req.id),
            required(&req.channel),
            required(&req.title),
        ) else {
            warn!("update: missing required field(s)");
            return Err(GatewayError::Validation(
                "Must provide id, channel and title".to_string(),
            ));
        };

        let update = AttributeUpdate {
            channel: Some(channel.to_string()),
            title: Some(title.to_string()),
            metadata: Some(req.metadata.clone().unwrap_or_default()),
            sent: None,
        };
        let item = self.store.update(id, update).await?;
        info!("update: {} saved", id);
        Ok(PublicRecord::without_created_date(&item))
    }

    /// `None` when no record has this id; callers answer with `{}`.
    pub async fn get(&self, id: &str) -> Result<Option<PublicRecord>, GatewayError> {
        let item = self.store.get(id).await?;
        if item.is_none() {
            info!("get: {} not found", id);
        }
        Ok(item.as_ref().map(PublicRecord::from_stored))
    }

    /// All records, unsorted.
    pub async fn list(&self) -> Result<Vec<PublicRecord>, GatewayError> {
        let items = self.store.scan().await?;
        info!("get: listing {} record(s)", items.len());
        Ok(items.iter().map(PublicRecord::from_stored).collect())
    }

    pub async fn delete(&self, id: Option<&str>) -> Result<DeleteAck, GatewayError> {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            warn!("delete: missing id");
            return Err(GatewayError::Validation("Must provide id".to_string()));
        };
        self.store.delete(id).await?;
        info!("delete: {} removed", id);
        Ok(DeleteAck::default())
    }
}
