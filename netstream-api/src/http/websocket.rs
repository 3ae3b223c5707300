//! WebSocket signaling endpoint
//!
//! Each socket is one party. Frames are JSON text `{"event", "data"}`.
//! Inbound frames go through `SessionHandler::run` via the `WebSocketStream`
//! implementation; outbound frames are queued in the connection hub and
//! written by a per-socket writer task that also pings the client.

use axum::{
    body::Bytes,
    extract::{
        ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use netstream_core::{ClientEvent, Error, PartyId, Result};

use crate::http::AppState;
use crate::impls::{is_room_full, SessionHandler, SignalStream};

/// WebSocket stream implementation of `SignalStream`
struct WebSocketStream {
    receiver: SplitStream<WebSocket>,
    last_activity: Instant,
    idle_timeout: Duration,
    writer_alive: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl SignalStream for WebSocketStream {
    async fn recv(&mut self) -> Option<Result<ClientEvent>> {
        loop {
            let message = match self.receiver.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Some(Err(Error::Transport(format!("WebSocket error: {e}")))),
                None => return None, // Stream ended
            };
            self.last_activity = Instant::now();

            match message {
                Message::Text(text) => return Some(ClientEvent::decode(text.as_str())),
                Message::Binary(bytes) => {
                    return Some(
                        std::str::from_utf8(&bytes)
                            .map_err(|e| Error::InvalidMessage(format!("binary frame is not UTF-8: {e}")))
                            .and_then(ClientEvent::decode),
                    );
                }
                Message::Close(_) => return None, // Graceful close
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.writer_alive.load(Ordering::Relaxed) && self.last_activity.elapsed() < self.idle_timeout
    }
}

/// WebSocket handler for signaling
///
/// <ws://host/ws>
pub async fn websocket_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    // Default limit is 64MB, signaling frames are small
    let max_size = state.config.signaling.max_message_size;
    ws.max_message_size(max_size)
        .max_frame_size(max_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let party_id = PartyId::new();
    let signaling = &state.config.signaling;
    let ping_interval = Duration::from_secs(signaling.ping_interval_seconds);

    info!(party_id = %party_id, "WebSocket connection established");

    // Register before joining so the role assignment has somewhere to go
    let outbound = state.hub.register(party_id.clone(), signaling.outbound_buffer);
    let writer_alive = Arc::new(AtomicBool::new(true));

    let (sink, receiver) = socket.split();
    let writer = tokio::spawn(write_frames(
        sink,
        outbound,
        ping_interval,
        writer_alive.clone(),
    ));

    let mut stream = WebSocketStream {
        receiver,
        last_activity: Instant::now(),
        idle_timeout: Duration::from_secs(signaling.ping_timeout_seconds),
        writer_alive,
    };

    let handler = SessionHandler::new(party_id.clone(), state.relay.clone(), ping_interval);
    let result = handler.run(&mut stream).await;

    // Dropping the queue lets the writer flush what is left and hand back the sink
    state.hub.unregister(&party_id);

    let close_frame = is_room_full(&result).then(|| CloseFrame {
        code: close_code::POLICY,
        reason: Utf8Bytes::from_static("Room is full"),
    });

    match writer.await {
        Ok(mut sink) => {
            if let Err(e) = sink.send(Message::Close(close_frame)).await {
                debug!(party_id = %party_id, error = %e, "Close frame not sent");
            }
        }
        Err(e) => error!(party_id = %party_id, error = %e, "WebSocket writer task failed"),
    }

    info!(party_id = %party_id, "WebSocket connection closed");
}

/// Drain the outbound queue onto the socket, pinging on every interval tick
///
/// Returns the sink once the queue is closed or the socket fails.
async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<String>,
    ping_interval: Duration,
    alive: Arc<AtomicBool>,
) -> SplitSink<WebSocket, Message> {
    let mut ticker = tokio::time::interval(ping_interval);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    warn!(error = %e, "Failed to send WebSocket message");
                    alive.store(false, Ordering::Relaxed);
                    break;
                }
            }

            _ = ticker.tick() => {
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    warn!(error = %e, "Failed to send WebSocket ping");
                    alive.store(false, Ordering::Relaxed);
                    break;
                }
            }
        }
    }

    sink
}
