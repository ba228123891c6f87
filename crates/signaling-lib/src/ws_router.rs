// ============================
// signaling-lib/src/ws_router.rs
// ============================
//! HTTP router and WebSocket connection handling.
//!
//! Each accepted connection gets one task running a select loop over three
//! sources: inbound socket frames, the connection's outbound queue, and the
//! keepalive timer. The loop is the only writer on the socket, so outbound
//! frames are serialised per connection. Leaving the loop, for any reason,
//! runs the departure path exactly once.

use crate::handlers::admin;
use crate::metrics::{WS_ACTIVE, WS_CONNECTION};
use crate::websocket::WebSocketHandler;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::HeaderValue,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.settings.cors.allowed_origins);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(admin::health))
        .route("/stats", get(admin::stats))
        .layer(cors)
        .with_state(state)
}

/// CORS layer from the configured origin whitelist; `"*"` allows any origin
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Handler for WebSocket upgrade requests
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    counter!(WS_CONNECTION).increment(1);
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    gauge!(WS_ACTIVE).increment(1.0);

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let conn_id = Uuid::new_v4();
    let mut handler = WebSocketHandler::new(state.clone(), conn_id, tx);

    let mut ping_timer = interval(state.settings.ping_interval());
    ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let pong_timeout = state.settings.pong_timeout();
    let mut last_pong = Instant::now();

    debug!(%conn_id, "connection open");

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => handler.handle_frame(&text),
                Some(Ok(Message::Pong(_))) => last_pong = Instant::now(),
                // Client pings are answered by the protocol layer
                Some(Ok(Message::Ping(_))) => {},
                // Binary frames are not part of the protocol
                Some(Ok(Message::Binary(_))) => {
                    debug!(%conn_id, "ignoring binary frame");
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(%conn_id, error = %e, "socket error");
                    break;
                },
            },

            outbound = rx.recv() => match outbound {
                Some(msg) => match serde_json::to_string(&msg) {
                    Ok(json) => {
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    },
                    Err(e) => {
                        warn!(%conn_id, error = %e, "failed to serialize outbound message");
                    },
                },
                None => break,
            },

            _ = ping_timer.tick() => {
                if last_pong.elapsed() >= pong_timeout {
                    info!(%conn_id, "keepalive timeout, dropping connection");
                    break;
                }
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            },
        }
    }

    // Transport close and explicit leave share the same departure path
    handler.handle_disconnect();

    gauge!(WS_ACTIVE).decrement(1.0);
    debug!(%conn_id, "connection closed");
}
