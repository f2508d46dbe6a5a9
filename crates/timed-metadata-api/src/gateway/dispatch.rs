use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use timed_metadata_proto::payload::{normalized_byte_len, MAX_DISPATCH_BYTES};
use timed_metadata_proto::protocol::{required, SendRequest};

use super::GatewayError;
use crate::control::StreamControl;
use crate::store::{AttributeUpdate, RecordStore};

/// Marker value written to a record's `Sent` attribute.
const SENT_MARKER: &str = "Yes";

/// Forwards payloads to a channel's metadata sideband and marks the record
/// as sent.
#[derive(Clone)]
pub struct DispatchGateway {
    control: Arc<dyn StreamControl>,
    store: Arc<dyn RecordStore>,
}

impl DispatchGateway {
    pub fn new(control: Arc<dyn StreamControl>, store: Arc<dyn RecordStore>) -> Self {
        Self { control, store }
    }

    /// Returns the control API's acknowledgment.
    ///
    /// Only the normalized payload is measured against the 1 KiB limit; the
    /// payload forwarded is the one the caller sent, byte for byte. The sent
    /// flag is written after the dispatch and is not rolled back on failure.
    pub async fn send(&self, req: SendRequest) -> Result<Value, GatewayError> {
        let (Some(id), Some(channel_arn), Some(metadata)) = (
            required(&req.id),
            required(&req.channel_arn),
            required(&req.metadata),
        ) else {
            warn!("send: missing required field(s)");
            return Err(GatewayError::Validation(
                "Must provide id, channelArn and metadata".to_string(),
            ));
        };

        let byte_len = normalized_byte_len(metadata);
        if byte_len > MAX_DISPATCH_BYTES {
            warn!("send: {} rejected, {} normalized bytes", id, byte_len);
            return Err(GatewayError::Validation(
                "Too big. Must be less than or equal to 1K".to_string(),
            ));
        }

        let ack = self
            .control
            .put_metadata(channel_arn, metadata)
            .await
            .map_err(|e| {
                error!("send: dispatch of {} to {} failed: {}", id, channel_arn, e);
                GatewayError::Dispatch(e)
            })?;
        info!("send: {} dispatched to {} ({} bytes)", id, channel_arn, byte_len);

        let update = AttributeUpdate {
            sent: Some(SENT_MARKER.to_string()),
            ..Default::default()
        };
        if let Err(e) = self.store.update(id, update).await {
            error!(
                "send: PARTIAL - {} reached {} but the sent flag was not stored: {}",
                id, channel_arn, e
            );
            return Err(GatewayError::PartialSend(e));
        }

        Ok(ack)
    }
}
