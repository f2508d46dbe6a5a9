use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use super::GatewayError;
use crate::control::StreamControl;

/// Read-only view of the channels the control API knows about.
#[derive(Clone)]
pub struct ChannelDirectory {
    control: Arc<dyn StreamControl>,
}

impl ChannelDirectory {
    pub fn new(control: Arc<dyn StreamControl>) -> Self {
        Self { control }
    }

    /// The control API's listing, passed through untouched.
    pub async fn list(&self) -> Result<Value, GatewayError> {
        match self.control.list_channels().await {
            Ok(listing) => {
                let count = listing
                    .get("channels")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                info!("channels: {} channel(s) listed", count);
                Ok(listing)
            }
            Err(e) => {
                error!("channels: listing failed: {}", e);
                Err(GatewayError::Service(e))
            }
        }
    }
}
