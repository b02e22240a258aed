use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use encore_core::types::DbId;
use encore_events::{Delivery, QueueEvent, QueueEventKind, Subscription};
use futures::{SinkExt, StreamExt};

use crate::error::AppResult;
use crate::extract::AppPath;
use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Keepalive text frame clients may send.
const CLIENT_PING: &str = "ping";

/// GET /ws/sessions/{session_id}
///
/// Subscribes before upgrading, so unknown or ended sessions are refused
/// with a JSON error instead of an accepted socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    AppPath(session_id): AppPath<DbId>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    let subscription = state.engine.subscribe(session_id)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, subscription)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// The sender task forwards queue notifications and manager control frames
/// to the sink; the current task consumes inbound frames until the client
/// goes away.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, mut subscription: Subscription) {
    let session_id = subscription.session_id();
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, session_id, "WebSocket connected");

    let mut control = ws_manager.add(conn_id.clone(), session_id).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let outbound = tokio::select! {
                delivery = subscription.next() => match delivery {
                    Some(Delivery::Event(event)) => Message::Text(event.to_wire().into()),
                    Some(Delivery::Lagged(skipped)) => {
                        tracing::debug!(conn_id = %sender_conn_id, skipped, "Subscriber lagged, sending refetch cue");
                        let cue = QueueEvent::new(QueueEventKind::RequestUpdate, session_id);
                        Message::Text(cue.to_wire().into())
                    }
                    None => {
                        // Session ended.
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                },
                msg = control.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let closing = matches!(outbound, Message::Close(_));
            if sink.send(outbound).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    loop {
        let result = tokio::select! {
            // Sender finished: session ended, idle reap, or shutdown.
            _ = &mut send_task => break,
            frame = stream.next() => match frame {
                Some(result) => result,
                None => break,
            },
        };
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Text(text)) => {
                ws_manager.touch(&conn_id).await;
                if text.as_str() != CLIENT_PING {
                    tracing::trace!(conn_id = %conn_id, "Ignoring client text frame");
                }
            }
            Ok(_) => ws_manager.touch(&conn_id).await,
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, session_id, "WebSocket disconnected");
}
