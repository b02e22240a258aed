use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use encore_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Session whose queue this connection follows.
    pub session_id: DbId,
    /// Channel sender for outbound control messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
    /// Last time any frame arrived from the client.
    pub last_seen: Instant,
}

/// Manages all active WebSocket connections.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection following `session_id`.
    ///
    /// Returns the receiver half of the control channel so the caller can
    /// forward pings and close frames to the WebSocket sink.
    pub async fn add(&self, conn_id: String, session_id: DbId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            session_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
            last_seen: Instant::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Record inbound activity on a connection.
    pub async fn touch(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.last_seen = Instant::now();
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of connections following one session.
    pub async fn session_connection_count(&self, session_id: DbId) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.session_id == session_id)
            .count()
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }

    /// Close and forget connections that have been silent for longer than
    /// `idle`. Returns how many were dropped.
    pub async fn reap_idle(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut conns = self.connections.write().await;
        let stale: Vec<String> = conns
            .iter()
            .filter(|(_, conn)| now.duration_since(conn.last_seen) > idle)
            .map(|(id, _)| id.clone())
            .collect();

        for conn_id in &stale {
            if let Some(conn) = conns.remove(conn_id) {
                let _ = conn.sender.send(Message::Close(None));
                tracing::debug!(conn_id = %conn_id, session_id = conn.session_id, "Idle WebSocket dropped");
            }
        }
        stale.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
