use crate::{config::Config, errors::AppError, mcp::handler::McpHandler, sessions::Sessions, tools::utc_timestamp};
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub handler: Arc<McpHandler>,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(cfg: Config, handler: McpHandler) -> Self {
        Self { cfg: Arc::new(cfg), handler: Arc::new(handler), sessions: Sessions::default() }
    }
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind = (state.cfg.server.bind_addr.clone(), state.cfg.server.port);
    let listener = tokio::net::TcpListener::bind((bind.0.as_str(), bind.1))
        .await
        .with_context(|| format!("binding {}:{}", bind.0, bind.1))?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, build_router(state)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

pub fn build_router(state: AppState) -> Router {
    let cfg = state.cfg.clone();
    let limit_bytes = cfg.limits.max_request_kb * 1024;
    Router::new()
        .route("/health", get(health))
        .route(&cfg.server.base_path, post(rpc))
        .route(&cfg.transport.sse_path, get(sse))
        .route(&cfg.transport.message_path, post(message))
        .layer(RequestBodyLimitLayer::new(limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let info = state.handler.info();
    Json(json!({
        "status": "ok",
        "name": info.name,
        "version": info.version,
        "time": utc_timestamp(),
        "sse_sessions": state.sessions.len(),
    }))
}

/// Streamable HTTP: one JSON-RPC message in, its response in the body.
async fn rpc(State(state): State<AppState>, body: Bytes) -> Response {
    match state.handler.handle_bytes(&body).await {
        Some(out) => (StatusCode::OK, Json(out)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn sse(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (guard, mut rx) = state.sessions.open();
    let endpoint = format!("{}?session_id={}", state.cfg.transport.message_path, guard.id());
    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok::<_, axum::Error>(Event::default().event("endpoint").data(endpoint));
        while let Some(out) = rx.recv().await {
            yield Event::default().event("message").json_data(&out);
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Uuid,
}

/// Legacy HTTP+SSE transport: accept the message, answer on the session stream.
async fn message(State(state): State<AppState>, Query(q): Query<MessageQuery>, body: Bytes) -> Response {
    let Some(tx) = state.sessions.sender(&q.session_id) else {
        return AppError::SessionNotFound.into_response();
    };
    if let Some(out) = state.handler.handle_bytes(&body).await {
        // a stalled reader must not park this request
        match tx.try_send(out) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(session_id = %q.session_id, "session stream full");
                return AppError::SessionBusy.into_response();
            }
            Err(TrySendError::Closed(_)) => return AppError::SessionNotFound.into_response(),
        }
    }
    StatusCode::ACCEPTED.into_response()
}
