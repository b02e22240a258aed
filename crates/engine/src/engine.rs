//! [`QueueEngine`]: the façade the HTTP and WebSocket layers call.
//!
//! Every mutation resolves its session, takes that session's lock with a
//! bounded wait, applies the change through the store / transition authority,
//! releases the lock, and only then publishes a [`QueueEvent`]. Reads take the
//! shared half of the same lock, so a list never sees a half-applied move.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use encore_core::error::CoreError;
use encore_core::models::request::{Request, SubmitRequest, VoteDirection};
use encore_core::models::session::{Session, SessionSummary};
use encore_core::status::RequestStatus;
use encore_core::types::DbId;
use encore_events::{QueueEvent, SessionHub, Subscription};

use crate::config::EngineConfig;
use crate::registry::{SessionRegistry, SessionSlot};
use crate::transition;

pub struct QueueEngine {
    registry: SessionRegistry,
    /// Request id -> owning session id.
    request_sessions: DashMap<DbId, DbId>,
    next_request_id: AtomicI64,
    hub: Arc<SessionHub>,
    config: EngineConfig,
}

impl QueueEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            request_sessions: DashMap::new(),
            next_request_id: AtomicI64::new(1),
            hub: Arc::new(SessionHub::new(config.event_capacity)),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn hub(&self) -> &Arc<SessionHub> {
        &self.hub
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    pub fn create_session(&self, name: &str) -> Result<Session, CoreError> {
        self.create_session_with_dj(name, None)
    }

    /// Start a session, optionally crediting a DJ by name.
    pub fn create_session_with_dj(
        &self,
        name: &str,
        dj_name: Option<&str>,
    ) -> Result<Session, CoreError> {
        let slot = self.registry.create(name, dj_name)?;
        tracing::info!(
            session_id = slot.id,
            slug = %slot.slug,
            name = %slot.name,
            dj_name = ?slot.dj_name,
            "Session started"
        );
        Ok(slot.snapshot())
    }

    pub fn resolve_session(&self, slug: &str) -> Result<Session, CoreError> {
        Ok(self.registry.resolve(slug)?.snapshot())
    }

    pub fn get_session(&self, session_id: DbId) -> Result<Session, CoreError> {
        Ok(self.registry.get(session_id)?.snapshot())
    }

    /// End a session. Idempotent.
    ///
    /// Later submissions fail with `SessionClosed` and every live
    /// subscription is closed.
    pub async fn end_session(&self, session_id: DbId) -> Result<Session, CoreError> {
        let slot = self.registry.get(session_id)?;
        let newly_ended = {
            let mut queue = slot.write(self.config.lock_wait).await?;
            slot.mark_ended(&mut queue)
        };

        if newly_ended {
            let closed = self.hub.close(session_id);
            tracing::info!(session_id, closed_subscriptions = closed, "Session ended");
        }
        Ok(slot.snapshot())
    }

    /// Admin listing with live request counts, newest session first.
    ///
    /// Takes no session lock.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.registry
            .all()
            .into_iter()
            .map(|slot| {
                let request_count = slot.request_count();
                let session = slot.snapshot();
                SessionSummary {
                    id: session.id,
                    name: session.name,
                    slug: session.slug,
                    dj_name: session.dj_name,
                    is_active: session.is_active,
                    created_at: session.created_at,
                    ends_at: session.ends_at,
                    request_count,
                }
            })
            .collect()
    }

    /// Subscribe to a live session's change notifications.
    pub fn subscribe(&self, session_id: DbId) -> Result<Subscription, CoreError> {
        let slot = self.registry.get(session_id)?;
        if !slot.is_active() {
            return Err(CoreError::SessionClosed { session_id });
        }
        self.hub.subscribe(session_id)
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Audience submission: validated, appended as `pending` at position N+1.
    pub async fn submit_request(
        &self,
        session_id: DbId,
        input: SubmitRequest,
    ) -> Result<Request, CoreError> {
        let new = input.validate()?;
        let slot = self.registry.get(session_id)?;

        let request = {
            let mut queue = slot.write(self.config.lock_wait).await?;
            if !slot.is_active() {
                return Err(CoreError::SessionClosed { session_id });
            }
            let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
            let request = queue.insert(id, new, Utc::now()).clone();
            slot.sync_request_count(&queue);
            self.request_sessions.insert(id, session_id);
            request
        };

        tracing::debug!(
            session_id,
            request_id = request.id,
            position = request.position,
            "Request submitted"
        );
        self.hub
            .publish(QueueEvent::request_new(session_id, request.id));
        Ok(request)
    }

    /// Requests of a session in queue order, optionally filtered by status.
    pub async fn list_requests(
        &self,
        session_id: DbId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<Request>, CoreError> {
        let slot = self.registry.get(session_id)?;
        let queue = slot.read(self.config.lock_wait).await?;
        Ok(queue.list(status))
    }

    pub async fn get_request(&self, request_id: DbId) -> Result<Request, CoreError> {
        let slot = self.slot_for_request(request_id)?;
        let queue = slot.read(self.config.lock_wait).await?;
        queue.require(request_id).cloned()
    }

    /// Set a request's status through the transition authority.
    pub async fn set_status(
        &self,
        request_id: DbId,
        status: RequestStatus,
    ) -> Result<Request, CoreError> {
        let slot = self.slot_for_request(request_id)?;
        let change = {
            let mut queue = slot.write(self.config.lock_wait).await?;
            transition::apply_status(&mut queue, request_id, status)?
        };

        if change.changed() {
            tracing::debug!(
                session_id = slot.id,
                request_id,
                from = %change.from,
                to = %change.request.status,
                demoted = ?change.demoted,
                "Request status changed"
            );
            if let Some(demoted) = change.demoted {
                self.hub.publish(QueueEvent::request_update(slot.id, demoted));
            }
            self.hub
                .publish(QueueEvent::request_update(slot.id, request_id));
        }
        Ok(change.request)
    }

    /// Move an orderable request to `position` (clamped to `[1, N]`).
    pub async fn reposition(&self, request_id: DbId, position: i64) -> Result<Request, CoreError> {
        let slot = self.slot_for_request(request_id)?;
        let (before, request) = {
            let mut queue = slot.write(self.config.lock_wait).await?;
            let before = queue.require(request_id)?.position;
            let request = queue.reposition(request_id, position)?.clone();
            (before, request)
        };

        if before != request.position {
            tracing::debug!(
                session_id = slot.id,
                request_id,
                from = before,
                to = request.position,
                "Request repositioned"
            );
            self.hub
                .publish(QueueEvent::request_update(slot.id, request_id));
        }
        Ok(request)
    }

    /// Adjust a request's vote count. Votes never affect position.
    pub async fn vote(&self, request_id: DbId, direction: VoteDirection) -> Result<Request, CoreError> {
        let slot = self.slot_for_request(request_id)?;
        let (before, request) = {
            let mut queue = slot.write(self.config.lock_wait).await?;
            if !slot.is_active() {
                return Err(CoreError::SessionClosed {
                    session_id: slot.id,
                });
            }
            let before = queue.require(request_id)?.votes;
            let request = queue
                .update(request_id, |r| {
                    if r.status.is_terminal() {
                        return Err(CoreError::Conflict(format!(
                            "request {request_id} is {} and no longer accepts votes",
                            r.status
                        )));
                    }
                    r.votes = match direction {
                        VoteDirection::Up => r.votes.saturating_add(1),
                        VoteDirection::Down => (r.votes - 1).max(0),
                    };
                    Ok(())
                })?
                .clone();
            (before, request)
        };

        if before != request.votes {
            self.hub
                .publish(QueueEvent::request_update(slot.id, request_id));
        }
        Ok(request)
    }

    fn slot_for_request(&self, request_id: DbId) -> Result<Arc<SessionSlot>, CoreError> {
        let session_id = *self
            .request_sessions
            .get(&request_id)
            .ok_or_else(|| CoreError::not_found("Request", request_id))?;
        self.registry.get(session_id)
    }
}

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use encore_core::models::request::SubmitRequest;

    #[tokio::test(start_paused = true)]
    async fn list_sessions_does_not_wait_on_a_locked_session() {
        let engine = QueueEngine::new(EngineConfig {
            lock_wait: Duration::from_millis(50),
            ..EngineConfig::default()
        });
        let locked = engine.create_session("Locked").unwrap();
        let open = engine.create_session("Open").unwrap();
        for title in ["A", "B"] {
            engine
                .submit_request(
                    locked.id,
                    SubmitRequest {
                        song_title: title.into(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let slot = engine.registry.get(locked.id).unwrap();
        let _held = slot.write(Duration::from_secs(1)).await.unwrap();

        let summaries = engine.list_sessions();
        assert_eq!(summaries.len(), 2);
        let locked_row = summaries.iter().find(|s| s.id == locked.id).unwrap();
        assert_eq!(locked_row.request_count, 2);
        let open_row = summaries.iter().find(|s| s.id == open.id).unwrap();
        assert_eq!(open_row.request_count, 0);

        // Reads that need the queue still report contention.
        assert!(matches!(
            engine.list_requests(locked.id, None).await,
            Err(CoreError::Busy { .. })
        ));
    }
}
