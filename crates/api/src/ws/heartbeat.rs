use std::sync::Arc;
use std::time::Duration;

use encore_events::SessionHub;
use tokio_util::sync::CancellationToken;

use crate::ws::manager::WsManager;

/// Spawn the keepalive task.
///
/// Every `interval` it pings all clients, drops connections silent for longer
/// than `idle_timeout`, and prunes notification channels nobody listens to.
/// Runs until `cancel` fires.
pub fn start_heartbeat(
    ws_manager: Arc<WsManager>,
    hub: Arc<SessionHub>,
    interval: Duration,
    idle_timeout: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let reaped = ws_manager.reap_idle(idle_timeout).await;
            let count = ws_manager.connection_count().await;
            tracing::debug!(count, reaped, "WebSocket heartbeat ping");
            ws_manager.ping_all().await;

            let pruned = hub.prune();
            if pruned > 0 {
                tracing::debug!(pruned, "Pruned idle notification channels");
            }
        }
        tracing::debug!("Heartbeat task stopped");
    })
}
