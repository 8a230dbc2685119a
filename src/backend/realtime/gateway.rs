/**
 * WebSocket Gateway Handler
 *
 * This module accepts realtime connections, authenticates them during the
 * HTTP handshake, and then services `join`/`leave` frames for the lifetime
 * of the connection.
 *
 * # Handshake
 *
 * The access token arrives either as `Authorization: Bearer <token>` or as
 * a `token` query parameter (browser WebSocket clients cannot set headers).
 * Verification happens before the protocol upgrade; a failed check rejects
 * the handshake with 401 and no socket is ever opened.
 *
 * # Connection Tasks
 *
 * Each connection runs a writer task draining a bounded outbound queue,
 * plus one forwarder task per joined room piping that room's broadcast
 * receiver into the queue. A forwarder that observes a lag sends the
 * client a `resync` frame for that room instead of the dropped events.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::error::AuthError;
use crate::backend::middleware::auth::{bearer_token, AuthenticatedAccount};
use crate::backend::server::state::AppState;
use crate::shared::{ClientFrame, RoomEvent, ServerFrame};

/// Outbound queue depth per connection
const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// Authenticate the handshake request before upgrading
///
/// Header takes precedence over the query parameter when both are present.
fn authenticate_handshake(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<AuthenticatedAccount, AuthError> {
    let token = bearer_token(headers)
        .or_else(|| query.get("token").map(String::as_str))
        .ok_or(AuthError::Unauthorized)?;

    let claims = state.tokens.verify_access(token)?;
    Ok(AuthenticatedAccount { account_id: claims.account_id()?, role: claims.role })
}

/// WebSocket endpoint for the realtime gateway
///
/// `GET /gateway` with an access token. Rejected handshakes return the
/// standard auth error body instead of upgrading.
pub async fn handle_gateway(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let account = match authenticate_handshake(&state, &headers, &query) {
        Ok(account) => account,
        Err(err) => {
            tracing::warn!("Gateway handshake rejected: {}", err);
            return err.into_response();
        }
    };

    tracing::info!("Gateway handshake admitted for account {}", account.account_id);
    ws.on_upgrade(move |socket| handle_connection(socket, state, account))
}

/// Service one admitted gateway connection until it closes
async fn handle_connection(socket: WebSocket, state: AppState, account: AuthenticatedAccount) {
    let conn_id = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();

    // All frames leave through one queue so room forwarders never contend
    // for the socket.
    let (out_tx, mut out_rx) = mpsc::channel::<ServerFrame>(OUTBOUND_QUEUE_DEPTH);

    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let Ok(json) = serde_json::to_string(&frame) else {
                continue;
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    if out_tx.send(ServerFrame::Admitted).await.is_err() {
        writer.abort();
        return;
    }

    // One forwarder task per joined room, keyed by room id
    let mut forwarders: HashMap<String, JoinHandle<()>> = HashMap::new();

    while let Some(Ok(message)) = ws_rx.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Pings are answered by axum; binary and pong frames are ignored
            _ => continue,
        };

        let frame = match serde_json::from_str::<ClientFrame>(text.as_str()) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!("Connection {} sent an unparseable frame: {}", conn_id, err);
                continue;
            }
        };

        match frame {
            ClientFrame::Join { room } => {
                if forwarders.contains_key(&room) {
                    continue;
                }
                let receiver = state.rooms.join(&room, conn_id);
                let handle = tokio::spawn(forward_room_events(
                    room.clone(),
                    receiver,
                    out_tx.clone(),
                ));
                forwarders.insert(room, handle);
            }
            ClientFrame::Leave { room } => {
                if let Some(handle) = forwarders.remove(&room) {
                    handle.abort();
                    state.rooms.leave(&room, conn_id);
                }
            }
        }
    }

    for handle in forwarders.values() {
        handle.abort();
    }
    state.rooms.leave_all(conn_id);
    writer.abort();
    tracing::info!(
        "Gateway connection {} for account {} closed",
        conn_id,
        account.account_id
    );
}

/// Pipe one room's broadcast stream into the connection's outbound queue
async fn forward_room_events(
    room: String,
    mut receiver: broadcast::Receiver<RoomEvent>,
    out_tx: mpsc::Sender<ServerFrame>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                if out_tx.send(ServerFrame::Event(event)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(dropped)) => {
                tracing::warn!("Connection lagged {} events in room {}", dropped, room);
                if out_tx
                    .send(ServerFrame::Resync { room: room.clone() })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
