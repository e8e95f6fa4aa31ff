//! HTTP streaming transport
//!
//! Serves the MCP protocol over an SSE subscription plus a session-scoped
//! message endpoint:
//!
//! - `GET /sse` opens the event stream; the first event is `endpoint` and
//!   carries the path subsequent messages must be POSTed to.
//! - `POST /messages?sessionId=` submits one JSON-RPC envelope; the
//!   response envelope is written to the session's stream as a `message`
//!   event and the POST itself is acknowledged with 202.
//! - `GET /health` reports process status and registered sessions.

use std::collections::HashMap;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::future;
use futures_util::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;

use crate::error::Result;
use crate::mcp::dispatcher::ToolDispatcher;
use crate::mcp::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::transport::session::SessionRegistry;

/// Fixed endpoint paths
pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages";

/// Shared state for the transport routes
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub dispatcher: Arc<ToolDispatcher>,
}

/// Build the transport router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SSE_PATH, get(open_stream))
        .route(MESSAGES_PATH, post(post_message))
        .route("/health", get(health))
        .with_state(state)
}

/// Run the HTTP transport until the process exits
pub async fn serve(dispatcher: Arc<ToolDispatcher>, port: u16) -> Result<()> {
    let registry = Arc::new(SessionRegistry::new());
    registry.spawn_sweeper();

    let state = AppState {
        registry,
        dispatcher,
    };

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP transport listening on {}", addr);
    info!("SSE endpoint: http://localhost:{}{}", port, SSE_PATH);
    info!(
        "Messages endpoint: http://localhost:{}{}?sessionId=<id>",
        port, MESSAGES_PATH
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Event stream that detaches its session's sink when the client goes
/// away and the stream is dropped.
struct SessionEventStream<S> {
    inner: S,
    registry: Arc<SessionRegistry>,
    session_id: String,
}

impl<S> Stream for SessionEventStream<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl<S> Drop for SessionEventStream<S> {
    fn drop(&mut self) {
        info!("SSE connection closed for session {}", self.session_id);
        self.registry.detach(&self.session_id);
    }
}

/// `GET /sse` — open the event-stream subscription
async fn open_stream(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !accept.contains("text/event-stream") {
        return (
            StatusCode::NOT_ACCEPTABLE,
            Json(serde_json::json!({
                "error": "Not Acceptable",
                "message": "Accept header must include text/event-stream",
            })),
        )
            .into_response();
    }

    let (session_id, rx) = state.registry.open();
    info!("SSE connection established for session {}", session_id);

    // A ready future keeps the chained stream Unpin for SessionEventStream
    let endpoint = format!("{}?sessionId={}", MESSAGES_PATH, session_id);
    let first = stream::once(future::ready(Ok::<_, Infallible>(
        Event::default().event("endpoint").data(endpoint),
    )));
    let rest = UnboundedReceiverStream::new(rx).map(Ok);

    let events = SessionEventStream {
        inner: first.chain(rest),
        registry: state.registry.clone(),
        session_id,
    };

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// `POST /messages?sessionId=` — submit one envelope for dispatch
async fn post_message(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    let Some(session_id) = params.get("sessionId") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::error(
                None,
                JsonRpcError::invalid_request("sessionId query parameter required"),
            )),
        )
            .into_response();
    };

    // Reject unknown ids outright; sessions are never created implicitly
    let Some(dispatch_lock) = state.registry.dispatch_lock(session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(JsonRpcResponse::error(
                None,
                JsonRpcError::session_not_found("Session expired or invalid"),
            )),
        )
            .into_response();
    };

    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(e) => {
            // Echo the correlation id when the body is at least JSON
            let id = recover_request_id(&body);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(JsonRpcResponse::error(
                    id,
                    JsonRpcError::internal_error(e.to_string()),
                )),
            )
                .into_response();
        }
    };

    // Messages for one session are processed in arrival order; sessions
    // are independent of each other.
    let _guard = dispatch_lock.lock().await;

    if let Some(response) = state.dispatcher.handle_request(request).await {
        match serde_json::to_string(&response) {
            Ok(payload) => {
                let delivered = state
                    .registry
                    .send(session_id, Event::default().event("message").data(payload));
                if !delivered {
                    tracing::debug!(
                        "dropping response for detached session {}",
                        session_id
                    );
                }
            }
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(JsonRpcResponse::error(
                        response.id,
                        JsonRpcError::internal_error(e.to_string()),
                    )),
                )
                    .into_response();
            }
        }
    }

    // The POST is acknowledged regardless of sink delivery
    StatusCode::ACCEPTED.into_response()
}

/// Pull the correlation id out of a body that is JSON but not a valid
/// request envelope.
fn recover_request_id(body: &str) -> Option<RequestId> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("id").cloned())
        .and_then(|id| serde_json::from_value(id).ok())
}

/// `GET /health` — process status and registered sessions
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "server": "gmail-mcp",
        "endpoints": {
            "sse": SSE_PATH,
            "messages": MESSAGES_PATH,
        },
        "activeSessions": state.registry.len(),
        "sessions": state.registry.session_ids(),
    }))
}
