//! The three request-handling gateways and the error type they share.
//!
//! Gateways validate input before touching the store or the control API, and
//! turn every downstream failure into a `GatewayError` the HTTP layer maps to
//! a response.

pub mod channels;
pub mod dispatch;
pub mod records;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use timed_metadata_proto::protocol::ErrorBody;

use crate::control::{ControlError, StreamControl};
use crate::store::{RecordStore, StoreError};

pub use channels::ChannelDirectory;
pub use dispatch::DispatchGateway;
pub use records::RecordGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or oversized input; the caller can fix it.
    #[error("{0}")]
    Validation(String),
    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
    #[error("Channel directory error: {0}")]
    Service(ControlError),
    #[error("Metadata dispatch failed: {0}")]
    Dispatch(ControlError),
    /// The payload reached the channel but the record was not flagged as sent.
    #[error("Metadata dispatched but sent flag update failed: {0}")]
    PartialSend(StoreError),
}

impl GatewayError {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "validation",
            GatewayError::MalformedBody(_) => "malformed_body",
            GatewayError::Store(_) => "store",
            GatewayError::Service(_) => "service",
            GatewayError::Dispatch(_) => "dispatch",
            GatewayError::PartialSend(_) => "partial_send",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let dispatched = match &self {
            GatewayError::PartialSend(_) => Some(true),
            GatewayError::Dispatch(_) => Some(false),
            _ => None,
        };
        let body = ErrorBody {
            message: self.to_string(),
            kind: self.kind().to_string(),
            dispatched,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Everything the HTTP layer needs, cheap to clone into handler state.
#[derive(Clone)]
pub struct Gateways {
    pub records: RecordGateway,
    pub channels: ChannelDirectory,
    pub dispatch: DispatchGateway,
}

impl Gateways {
    pub fn new(store: Arc<dyn RecordStore>, control: Arc<dyn StreamControl>) -> Self {
        Self {
            records: RecordGateway::new(store.clone()),
            channels: ChannelDirectory::new(control.clone()),
            dispatch: DispatchGateway::new(control, store),
        }
    }
}
