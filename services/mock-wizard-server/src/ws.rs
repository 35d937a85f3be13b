use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use ic_protocol::{ClientMessage, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::session::MockSession;

pub(crate) async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("wizard socket opened");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Single writer so immediate and scheduled frames never interleave mid-send.
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to encode frame");
                    continue;
                }
            };
            debug!(action = message.tag(), "sending frame");
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = MockSession::new(state.config.fail_connect);
    let mut scheduled: Option<JoinHandle<()>> = None;

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "socket closed with error");
                break;
            }
        };

        if text.as_str() == "close" {
            break;
        }

        let message = match ClientMessage::from_json(text.as_str()) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, frame = text.as_str(), "ignoring client frame");
                continue;
            }
        };
        debug!(action = message.action.tag(), "received frame");

        let reply = session.handle(message);
        for message in reply.now {
            if tx.send(message).is_err() {
                break;
            }
        }
        if !reply.later.is_empty() {
            let next = schedule(tx.clone(), reply.later, state.config.step_delay);
            if let Some(previous) = scheduled.replace(next) {
                previous.abort();
            }
        }
    }

    if let Some(task) = scheduled {
        task.abort();
    }
    drop(tx);
    let _ = writer.await;
    info!(session_id = ?session.session_id().map(|id| id.as_str()), "wizard socket closed");
}

/// Queues `frames` one per `delay`, stopping early if the socket is gone.
pub(crate) fn schedule(
    tx: mpsc::UnboundedSender<ServerMessage>,
    frames: Vec<ServerMessage>,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for frame in frames {
            tokio::time::sleep(delay).await;
            if tx.send(frame).is_err() {
                debug!("socket gone, dropping scheduled frames");
                break;
            }
        }
    })
}
