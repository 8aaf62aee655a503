//! HTTP service shim for running the proxy standalone.
//!
//! The fallback route forwards every incoming request through the proxy;
//! a small control surface mirrors the cross-context message channel:
//! - `GET /_proxy/version` — current generation tag
//! - `GET /_proxy/tiers` — tier names and entry counts
//! - `POST /_proxy/message` — `SKIP_WAITING` / `GET_VERSION`
//! - `POST /_proxy/push` — inject a push payload

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::snapshot::ResponseSnapshot;
use crate::client::{ClientMessage, ClientRegistry, ClientWindow};
use crate::config::Config;
use crate::net::http::HttpFetcher;
use crate::net::{Method, Request, RequestMode};
use crate::notify::{Notification, NotificationSink};
use crate::proxy::{ControlMessage, Intercept, Proxy};

/// Application state shared across handlers.
pub struct AppState {
    pub proxy: Arc<Proxy>,
    pub upstream: Arc<HttpFetcher>,
    pub config: Arc<Config>,
}

/// Build the axum router with the control surface and the catch-all proxy
/// route.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/_proxy/version", get(version))
        .route("/_proxy/tiers", get(tiers))
        .route("/_proxy/message", post(message))
        .route("/_proxy/push", post(push))
        .fallback(proxy_request)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Control Surface ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct VersionResponse {
    version: String,
}

#[derive(Debug, Serialize)]
struct TierResponse {
    name: String,
    entries: usize,
}

async fn version(State(state): State<Arc<AppState>>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: state.proxy.version().as_str().to_string(),
    })
}

async fn tiers(State(state): State<Arc<AppState>>) -> Json<Vec<TierResponse>> {
    let store = state.proxy.store();
    let mut out = Vec::new();
    for name in store.tiers().await {
        let entries = store.keys(&name).await.len();
        out.push(TierResponse { name, entries });
    }
    Json(out)
}

async fn message(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
    let kind = body.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "SKIP_WAITING" => {
            state.proxy.message(ControlMessage::SkipWaiting).await;
            StatusCode::NO_CONTENT.into_response()
        }
        "GET_VERSION" => {
            let (reply, rx) = oneshot::channel();
            state
                .proxy
                .message(ControlMessage::GetVersion { reply })
                .await;
            match rx.await {
                Ok(version) => Json(VersionResponse {
                    version: version.as_str().to_string(),
                })
                .into_response(),
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        }
        other => {
            state
                .proxy
                .message(ControlMessage::Other(other.to_string()))
                .await;
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

async fn push(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    state.proxy.push(&body).await;
    StatusCode::NO_CONTENT
}

// ─── Proxy Route ───────────────────────────────────────────────────────────

async fn proxy_request(
    State(state): State<Arc<AppState>>,
    request: axum::extract::Request,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let (parts, body) = request.into_parts();

    let Some(method) = Method::parse(parts.method.as_str()) else {
        warn!(request_id, method = %parts.method, "unsupported method");
        return StatusCode::NOT_IMPLEMENTED.into_response();
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = match state.proxy.app_origin().join(path_and_query) {
        Ok(url) => url,
        Err(err) => {
            warn!(request_id, %err, "unroutable request target");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let headers: HashMap<String, String> = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let mode = detect_mode(&headers);

    let intercepted = Request {
        method,
        url,
        headers,
        mode,
    };
    debug!(request_id, method = %method, url = %intercepted.url, "intercepted request");

    match state.proxy.intercept(intercepted.clone()).await {
        Intercept::Respond(snapshot) => snapshot_response(snapshot),
        Intercept::Passthrough => {
            let body = match to_bytes(body, usize::MAX).await {
                Ok(bytes) => (!bytes.is_empty()).then_some(bytes),
                Err(err) => {
                    warn!(request_id, %err, "failed to buffer request body");
                    return StatusCode::BAD_REQUEST.into_response();
                }
            };
            match state.upstream.forward(&intercepted, body).await {
                Ok(snapshot) => snapshot_response(snapshot),
                Err(err) => {
                    warn!(request_id, url = %intercepted.url, %err, "passthrough failed");
                    StatusCode::BAD_GATEWAY.into_response()
                }
            }
        }
    }
}

fn detect_mode(headers: &HashMap<String, String>) -> RequestMode {
    if headers.get("sec-fetch-mode").map(String::as_str) == Some("navigate") {
        return RequestMode::Navigate;
    }
    if headers
        .get("accept")
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
    {
        return RequestMode::Navigate;
    }
    RequestMode::Cors
}

fn snapshot_response(snapshot: ResponseSnapshot) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::from_u16(snapshot.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));
    for (name, value) in &snapshot.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            builder = builder.header(name, value);
        }
    }
    builder
        .body(Body::from(snapshot.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

// ─── Host Adapters ─────────────────────────────────────────────────────────

/// Window registry for standalone deployments with no window bridge.
pub struct DetachedClients;

#[async_trait]
impl ClientRegistry for DetachedClients {
    async fn claim(&self) {
        debug!("no window bridge attached, claim is a no-op");
    }

    async fn windows(&self) -> Vec<ClientWindow> {
        Vec::new()
    }

    async fn focus(&self, _id: &str) -> bool {
        false
    }

    async fn post_message(&self, _id: &str, _message: ClientMessage) {}

    async fn open_window(&self, url: &str) {
        info!(url, "window open requested");
    }
}

/// Notification sink that records displays in the log.
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn show(&self, notification: &Notification) {
        info!(
            title = %notification.title,
            tag = %notification.tag,
            "notification displayed"
        );
    }

    async fn close(&self, tag: &str) {
        debug!(tag, "notification closed");
    }
}
