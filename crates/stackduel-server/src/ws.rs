use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use stackduel_core::net::messages::ClientEvent;
use stackduel_core::net::protocol::decode_client_event;
use stackduel_core::player::ParticipantId;

use crate::rate_limit::RateLimiter;
use crate::state::{AppState, ConnectionGuard};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));

    ws.on_upgrade(move |socket| handle_socket(socket, state, guard))
}

async fn handle_socket(socket: WebSocket, state: AppState, _guard: ConnectionGuard) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::channel::<Bytes>(state.config.limits.player_message_buffer);

    let participant = state.coordinator.write().await.connect(tx);
    tracing::info!(participant_id = participant, "Client connected");

    spawn_writer(ws_sender, rx);

    read_loop(&mut ws_receiver, &state, participant).await;

    // Connection closed or failed: both end up here
    let outcome = state.coordinator.write().await.on_disconnect(participant);
    tracing::info!(participant_id = participant, ?outcome, "Client disconnected");
}

fn spawn_writer(mut ws_sender: SplitSink<WebSocket, Message>, mut rx: mpsc::Receiver<Bytes>) {
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            let Ok(text) = String::from_utf8(data.to_vec()) else {
                tracing::warn!("Dropping non UTF-8 outbound frame");
                continue;
            };
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        // Best effort; the peer may already be gone
        let _ = ws_sender.close().await;
    });
}

async fn read_loop(
    ws_receiver: &mut SplitStream<WebSocket>,
    state: &AppState,
    participant: ParticipantId,
) {
    let limits = &state.config.limits;
    let mut rate_limiter = RateLimiter::per_second(limits.ws_rate_limit_per_sec);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        let data = text.as_str().as_bytes();
        if data.len() > limits.max_message_size {
            tracing::warn!(participant_id = participant, size = data.len(), "Oversized frame");
            continue;
        }

        let event = match decode_client_event(data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(participant_id = participant, error = %e, "Malformed frame");
                continue;
            },
        };

        // Only board snapshots are throttled. A newer one supersedes a dropped
        // one, while joins, clears and game overs must always get through.
        if matches!(event, ClientEvent::GameUpdate(_)) && !rate_limiter.allow() {
            tracing::warn!(participant_id = participant, "Rate limited game_update");
            continue;
        }

        dispatch(state, participant, event).await;
    }
}

/// Joins and game overs change membership and need the write lock; per-frame
/// relay traffic only reads.
async fn dispatch(state: &AppState, participant: ParticipantId, event: ClientEvent) {
    let name = event.name();
    if event.mutates_sessions() {
        let outcome = state
            .coordinator
            .write()
            .await
            .handle_event(participant, event);
        tracing::debug!(participant_id = participant, event = name, ?outcome, "Handled event");
    } else {
        let outcome = state.coordinator.read().await.route_relay(participant, event);
        tracing::trace!(participant_id = participant, event = name, ?outcome, "Relayed event");
    }
}
