//! HTTP surface of the gateways.
//!
//! | Route                     | Gateway                        |
//! |---------------------------|--------------------------------|
//! | `GET  {base}[?id=]`       | records: list / get one        |
//! | `POST {base}`             | records: create                |
//! | `POST {base}/update`      | records: update                |
//! | `GET  {base}/delete?id=`  | records: delete                |
//! | `GET  {base}/channels`    | channel directory              |
//! | `POST {base}/send`        | metadata dispatch              |
//!
//! Bodies are read as raw bytes and parsed as JSON whatever the
//! `Content-Type` says; browser clients post them as `text/plain`.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use timed_metadata_proto::config::HttpConfig;
use timed_metadata_proto::protocol::{
    required, CreateRequest, DeleteAck, IdQuery, PublicRecord, SendRequest, StoredRecord,
};

use crate::gateway::{GatewayError, Gateways};

pub fn router(gateways: Gateways, base_path: &str) -> Router {
    let base = base_path.trim_end_matches('/');

    let mut app = Router::new()
        .route(&route_path(base, ""), get(get_records).post(create_record))
        .route(&route_path(base, "/update"), post(update_record))
        .route(&route_path(base, "/delete"), get(delete_record))
        .route(&route_path(base, "/channels"), get(list_channels))
        .route(&route_path(base, "/send"), post(send_metadata));

    // Clients built against `{base}/` should hit the same collection route.
    if !base.is_empty() {
        app = app.route(&format!("{}/", base), get(get_records).post(create_record));
    }

    app.layer(cors_layer()).with_state(gateways)
}

pub async fn serve(config: &HttpConfig, gateways: Gateways) -> anyhow::Result<()> {
    let app = router(gateways, &config.base_path);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        error!("Failed to bind HTTP server to {}: {}", addr, e);
        e
    })?;

    info!(
        "Gateway listening on http://{}{}",
        addr,
        config.base_path.trim_end_matches('/')
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn route_path(base: &str, suffix: &str) -> String {
    let path = format!("{}{}", base, suffix);
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([
            Method::OPTIONS,
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
        ])
}

/// An empty body reads as `{}` so it fails field validation, not parsing.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Logs the failure with its kind before it becomes a response.
fn reject(op: &str, err: GatewayError) -> GatewayError {
    match &err {
        GatewayError::Validation(msg) => info!("{}: 400 {}", op, msg),
        other => error!("{}: {} {}", op, other.kind(), other),
    }
    err
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn create_record(
    State(gw): State<Gateways>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredRecord>), GatewayError> {
    let req: CreateRequest = parse_body(&body).map_err(|e| reject("create", e))?;
    let item = gw.records.create(req).await.map_err(|e| reject("create", e))?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_record(
    State(gw): State<Gateways>,
    body: Bytes,
) -> Result<Json<PublicRecord>, GatewayError> {
    let req = parse_body(&body).map_err(|e| reject("update", e))?;
    let record = gw.records.update(req).await.map_err(|e| reject("update", e))?;
    Ok(Json(record))
}

async fn get_records(
    State(gw): State<Gateways>,
    Query(query): Query<IdQuery>,
) -> Result<Response, GatewayError> {
    if let Some(id) = required(&query.id) {
        let record = gw.records.get(id).await.map_err(|e| reject("get", e))?;
        return Ok(match record {
            Some(record) => Json(record).into_response(),
            None => Json(json!({})).into_response(),
        });
    }
    let records = gw.records.list().await.map_err(|e| reject("get", e))?;
    Ok(Json(records).into_response())
}

async fn delete_record(
    State(gw): State<Gateways>,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteAck>, GatewayError> {
    let ack = gw
        .records
        .delete(query.id.as_deref())
        .await
        .map_err(|e| reject("delete", e))?;
    Ok(Json(ack))
}

async fn list_channels(State(gw): State<Gateways>) -> Result<Json<Value>, GatewayError> {
    let listing = gw.channels.list().await.map_err(|e| reject("channels", e))?;
    Ok(Json(listing))
}

async fn send_metadata(
    State(gw): State<Gateways>,
    body: Bytes,
) -> Result<Json<Value>, GatewayError> {
    let req: SendRequest = parse_body(&body).map_err(|e| reject("send", e))?;
    let ack = gw.dispatch.send(req).await.map_err(|e| reject("send", e))?;
    Ok(Json(ack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::LocalControl;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::sync::Arc;
    use timed_metadata_proto::config::ChannelSeed;
    use timed_metadata_proto::payload::MAX_DISPATCH_BYTES;
    use tower::ServiceExt;

    const ARN: &str = "arn:aws:ivs:us-west-2:1:channel/demo";

    fn app() -> (Router, Arc<LocalControl>) {
        let control = Arc::new(LocalControl::new(vec![ChannelSeed {
            arn: ARN.to_string(),
            name: "demo".to_string(),
            latency_mode: "LOW".to_string(),
        }]));
        let gateways = Gateways::new(Arc::new(MemoryStore::new()), control.clone());
        (router(gateways, "/metadata"), control)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(body)
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/metadata",
            Some(json!({ "channel": "demo", "title": "Untitled", "metadata": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["Id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let (app, _) = app();
        let id = create(&app).await;

        let (status, list) = call(&app, Method::GET, "/metadata", None).await;
        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["Id"], id.as_str());
        assert_eq!(list[0]["Channel"], "demo");
        assert_eq!(list[0]["Sent"], "No");
    }

    #[tokio::test]
    async fn test_create_missing_title_is_400() {
        let (app, _) = app();
        let (status, body) =
            call(&app, Method::POST, "/metadata", Some(json!({ "channel": "demo" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
        assert_eq!(body["message"], "Must provide channel and title");
    }

    #[tokio::test]
    async fn test_malformed_body_is_500() {
        let (app, _) = app();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/metadata")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_get_missing_id_returns_empty_object() {
        let (app, _) = app();
        let (status, body) = call(&app, Method::GET, "/metadata?id=nope", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_update_returns_filtered_record() {
        let (app, _) = app();
        let id = create(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/metadata/update",
            Some(json!({ "id": id, "channel": "demo", "title": "Quiz", "metadata": "{}" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Title"], "Quiz");
        assert_eq!(body["Sent"], "No");
        assert!(body.get("CreatedDate").is_none());

        let (status, _) = call(
            &app,
            Method::POST,
            "/metadata/update",
            Some(json!({ "channel": "demo", "title": "Quiz" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete() {
        let (app, _) = app();
        let id = create(&app).await;

        let (status, body) = call(&app, Method::GET, &format!("/metadata/delete?id={}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (status, _) = call(&app, Method::GET, "/metadata/delete?id=unknown", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, Method::GET, "/metadata/delete", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = call(&app, Method::GET, "/metadata", None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_channels_listing() {
        let (app, _) = app();
        let (status, body) = call(&app, Method::GET, "/metadata/channels", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["channels"][0]["arn"], ARN);
    }

    #[tokio::test]
    async fn test_send_oversized_is_400_and_not_dispatched() {
        let (app, control) = app();
        let id = create(&app).await;
        let metadata = format!("\"{}\"", "a".repeat(MAX_DISPATCH_BYTES - 1));
        assert_eq!(metadata.len(), MAX_DISPATCH_BYTES + 1);

        let (status, body) = call(
            &app,
            Method::POST,
            "/metadata/send",
            Some(json!({ "id": id, "channelArn": ARN, "metadata": metadata })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Too big. Must be less than or equal to 1K");
        assert!(control.dispatched().await.is_empty());

        let (_, record) = call(&app, Method::GET, &format!("/metadata?id={}", id), None).await;
        assert_eq!(record["Sent"], "No");
    }

    #[tokio::test]
    async fn test_send_marks_sent() {
        let (app, control) = app();
        let id = create(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/metadata/send",
            Some(json!({ "id": id, "channelArn": ARN, "metadata": "{\"q\": 1}" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
        assert_eq!(control.dispatched().await.len(), 1);

        let (_, record) = call(&app, Method::GET, &format!("/metadata?id={}", id), None).await;
        assert_eq!(record["Sent"], "Yes");
    }

    #[tokio::test]
    async fn test_send_to_unknown_channel_reports_not_dispatched() {
        let (app, _) = app();
        let id = create(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/metadata/send",
            Some(json!({ "id": id, "channelArn": "arn:nope", "metadata": "{}" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "dispatch");
        assert_eq!(body["dispatched"], false);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let (app, _) = app();
        let req = Request::builder()
            .method(Method::GET)
            .uri("/metadata")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert_eq!(
            resp.headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_trailing_slash_base_and_root_base() {
        let (app, _) = app();
        let (status, _) = call(&app, Method::GET, "/metadata/", None).await;
        assert_eq!(status, StatusCode::OK);

        let gateways = Gateways::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LocalControl::new(Vec::new())),
        );
        let root = router(gateways, "/");
        let (status, body) = call(&root, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        let (status, _) = call(&root, Method::GET, "/channels", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
