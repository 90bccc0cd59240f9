use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::state::AppState;
use crate::ws::session::Session;
use crate::ws::{ConnectionHandle, CLOSE_PONG_TIMEOUT};

/// Run the actor-per-connection pattern for a relay WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel
/// - Ping task: keeps the connection alive and closes it on pong timeout
/// - Reader loop (this task): feeds frames to the session in arrival order
///
/// The [`ConnectionHandle`] wraps the channel's sender; the registry and
/// the broadcaster only ever talk to the connection through it.
pub async fn run_connection(socket: WebSocket, state: AppState, peer: SocketAddr) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();
    let handle = ConnectionHandle::new(tx);
    let mut session = Session::new(handle.clone());

    tracing::info!(peer = %peer, connection = handle.id(), "WebSocket actor started");

    let mut writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();

    let ping_handle = {
        let handle = handle.clone();
        let ping_interval = state.keepalive.ping_interval;
        let pong_timeout = state.keepalive.pong_timeout;
        tokio::spawn(async move {
            let mut ping_timer = interval(ping_interval);
            // Skip the first immediate tick
            ping_timer.tick().await;

            loop {
                ping_timer.tick().await;

                if handle.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                    // Writer task has died, connection is gone
                    break;
                }

                match timeout(pong_timeout, pong_rx.recv()).await {
                    Ok(Some(())) => {}
                    _ => {
                        tracing::warn!(connection = handle.id(), "Pong timeout, closing connection");
                        handle.close(CLOSE_PONG_TIMEOUT, "Pong timeout");
                        break;
                    }
                }
            }
        })
    };

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(msg)) => match msg {
                    Message::Text(text) => {
                        session.handle_text(&state, text.as_str()).await;
                    }
                    Message::Binary(data) => {
                        tracing::debug!(
                            connection = handle.id(),
                            bytes = data.len(),
                            "Ignoring binary frame"
                        );
                    }
                    Message::Pong(_) => {
                        let _ = pong_tx.send(());
                    }
                    Message::Ping(data) => {
                        let _ = handle.send(Message::Pong(data));
                    }
                    Message::Close(frame) => {
                        tracing::info!(
                            connection = handle.id(),
                            reason = ?frame,
                            "Client initiated close"
                        );
                        break;
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!(connection = handle.id(), error = %e, "WebSocket receive error");
                    break;
                }
                None => {
                    tracing::info!(connection = handle.id(), "WebSocket stream ended");
                    break;
                }
            },
            // The writer stops after sending a server-side Close or when the
            // sink breaks; either way the connection is finished.
            _ = &mut writer_handle => {
                tracing::debug!(connection = handle.id(), "Writer finished, closing connection");
                break;
            }
        }
    }

    writer_handle.abort();
    ping_handle.abort();

    session.close(&state);

    tracing::info!(
        peer = %peer,
        connection = handle.id(),
        "WebSocket actor stopped"
    );
}

/// Writer task: receives messages from mpsc channel and forwards them to the WebSocket sink.
/// Stops after forwarding a Close frame so nothing is delivered past it.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        let is_close = matches!(msg, Message::Close(_));
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed, connection is broken
            break;
        }
        if is_close {
            break;
        }
    }
}
