//! WebSocket server for the gesture stream.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use futures::stream::{SplitSink, SplitStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{Instrument, debug, error, info, info_span, trace, warn};
use uuid::Uuid;

use crate::classifier::ClassifierFactory;
use crate::config::StreamConfig;
use crate::error::SessionError;
use crate::stream::mailbox::Mailbox;
use crate::stream::protocol::{ClientMessage, ServerMessage};
use crate::stream::session::{Inbound, Session};

/// Outbound messages waiting for the socket writer.
const OUTBOUND_CAPACITY: usize = 32;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct GestureState {
    pub config: Arc<StreamConfig>,
    /// Builds one classifier per connection.
    pub factory: ClassifierFactory,
}

/// Build the Axum router with the gesture socket and health probe.
pub fn gesture_routes(config: Arc<StreamConfig>, factory: ClassifierFactory) -> Router {
    let state = GestureState { config, factory };

    Router::new()
        .route("/ws/gesture", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sign-stream"
    }))
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GestureState>) -> impl IntoResponse {
    let id = Uuid::new_v4();
    debug!(session = %id, "gesture client connecting");
    ws.on_upgrade(move |socket| {
        handle_socket(socket, state, id).instrument(info_span!("session", id = %id))
    })
}

async fn handle_socket(socket: WebSocket, state: GestureState, id: Uuid) {
    info!("gesture client connected");

    let mut session = match Session::start(id, Arc::clone(&state.config), state.factory).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "failed to start session");
            return;
        }
    };

    let (sink, stream) = socket.split();
    let mailbox = Arc::new(Mailbox::new());
    let cancel = CancellationToken::new();
    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CAPACITY);

    let writer = spawn_writer(sink, out_rx, cancel.clone());
    let receiver = spawn_receiver(stream, Arc::clone(&mailbox), cancel.clone());
    let keepalive = spawn_keepalive(
        out_tx.clone(),
        state.config.keepalive_interval,
        cancel.clone(),
    );

    match session.run(&mailbox, &out_tx, &cancel).await {
        Ok(()) => {}
        Err(SessionError::OutboundClosed) => debug!("client went away mid-send"),
        Err(e) => error!(error = %e, "session failed"),
    }

    // Helpers first, then the worker: the engine closes on its own thread
    // once no call is in flight.
    cancel.cancel();
    mailbox.close();
    drop(out_tx);
    let _ = tokio::join!(receiver, keepalive, writer);

    let stats = session.stats(&mailbox);
    if let Err(e) = session.shutdown().await {
        warn!(error = %e, "classifier shutdown incomplete");
    }

    info!(
        received = stats.received,
        dropped = stats.dropped,
        skipped = stats.skipped,
        decode_errors = stats.decode_errors,
        inferences = stats.inferences,
        emissions = stats.emissions,
        "gesture session closed"
    );
}

/// Reads client messages into the mailbox. Never waits on processing.
fn spawn_receiver(
    mut stream: SplitStream<WebSocket>,
    mailbox: Arc<Mailbox<Inbound>>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut seq = 0u64;
            loop {
                let result = tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = stream.next() => result,
                };

                match result {
                    Some(Ok(Message::Text(text))) => match ClientMessage::parse(text.as_str()) {
                        Some(ClientMessage::Frame { data }) => {
                            let evicted = mailbox.push(Inbound {
                                seq,
                                arrived: Instant::now(),
                                payload: data,
                            });
                            if evicted {
                                trace!(seq, "replaced pending frame");
                            }
                            seq += 1;
                        }
                        None => debug!(len = text.as_str().len(), "ignoring client message"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("gesture client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            mailbox.close();
            cancel.cancel();
        }
        .in_current_span(),
    )
}

/// Sends a ping every `interval`, independent of frame flow.
fn spawn_keepalive(
    out_tx: mpsc::Sender<ServerMessage>,
    interval: std::time::Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if out_tx.send(ServerMessage::ping_now()).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
        .in_current_span(),
    )
}

/// Serializes outbound messages onto the socket.
fn spawn_writer(
    mut sink: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::Receiver<ServerMessage>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            loop {
                let msg = tokio::select! {
                    _ = cancel.cancelled() => break,
                    msg = out_rx.recv() => msg,
                };
                let Some(msg) = msg else { break };

                match serde_json::to_string(&msg) {
                    Ok(json) => {
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            debug!("client disconnected during send");
                            cancel.cancel();
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to serialize outbound message"),
                }
            }
            let _ = sink.close().await;
        }
        .in_current_span(),
    )
}
