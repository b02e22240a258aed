use std::sync::Arc;

use encore_engine::QueueEngine;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Session registry, queues, and change fan-out.
    pub engine: Arc<QueueEngine>,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (audience and DJ browsers).
    pub ws_manager: Arc<WsManager>,
}

impl AppState {
    /// Fresh state with an empty engine tuned from `config`.
    pub fn new(config: ServerConfig) -> Self {
        let engine = QueueEngine::new(config.engine_config());
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
            ws_manager: Arc::new(WsManager::new()),
        }
    }
}
