//! Session registry: slug issuance, lookup, and lifecycle.
//!
//! Each [`SessionSlot`] owns its request queue behind a `tokio::sync::RwLock`.
//! That lock is the session's mutation lock; different sessions never
//! contend. Slugs are recorded forever so an ended session's link can never
//! resolve to a different session.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use encore_core::error::CoreError;
use encore_core::models::session::{validate_dj_name, validate_name, Session};
use encore_core::slug;
use encore_core::types::{DbId, Timestamp};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::store::SessionQueue;

#[derive(Debug)]
pub struct SessionSlot {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub dj_name: Option<String>,
    pub created_at: Timestamp,
    /// Mirror of the queue length, refreshed under the write lock.
    request_count: AtomicUsize,
    /// Set exactly once, when the session ends.
    ended_at: OnceLock<Timestamp>,
    queue: RwLock<SessionQueue>,
}

impl SessionSlot {
    fn new(id: DbId, slug: String, name: String, dj_name: Option<String>) -> Self {
        Self {
            id,
            slug,
            name,
            dj_name,
            created_at: Utc::now(),
            request_count: AtomicUsize::new(0),
            ended_at: OnceLock::new(),
            queue: RwLock::new(SessionQueue::new(id)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.ended_at.get().is_none()
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at.get().copied()
    }

    pub fn snapshot(&self) -> Session {
        Session {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            dj_name: self.dj_name.clone(),
            is_active: self.is_active(),
            created_at: self.created_at,
            ends_at: self.ended_at(),
        }
    }

    /// Number of requests in the session, terminal ones included.
    ///
    /// Readable without the queue lock; requests are never removed, so the
    /// value only lags the store while a submission holds the write lock.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Acquire)
    }

    /// Refresh [`request_count`](Self::request_count) from the queue the
    /// caller has locked for writing.
    pub(crate) fn sync_request_count(&self, queue: &SessionQueue) {
        self.request_count.store(queue.len(), Ordering::Release);
    }

    /// Acquire the mutation lock, failing with `Busy` after `wait`.
    pub async fn write(
        &self,
        wait: Duration,
    ) -> Result<RwLockWriteGuard<'_, SessionQueue>, CoreError> {
        tokio::time::timeout(wait, self.queue.write())
            .await
            .map_err(|_| CoreError::Busy {
                session_id: self.id,
            })
    }

    /// Acquire shared read access, failing with `Busy` after `wait`.
    pub async fn read(&self, wait: Duration) -> Result<RwLockReadGuard<'_, SessionQueue>, CoreError> {
        tokio::time::timeout(wait, self.queue.read())
            .await
            .map_err(|_| CoreError::Busy {
                session_id: self.id,
            })
    }

    /// Mark the session ended. Returns `false` if it already was.
    ///
    /// Callers hold the write guard so the flip is ordered against
    /// submissions.
    pub(crate) fn mark_ended(&self, _guard: &mut SessionQueue) -> bool {
        self.ended_at.set(Utc::now()).is_ok()
    }
}

pub struct SessionRegistry {
    sessions: DashMap<DbId, Arc<SessionSlot>>,
    /// Every slug ever issued, including those of ended sessions.
    slugs: DashMap<String, DbId>,
    next_id: AtomicI64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            slugs: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Start a new, active session with a freshly issued slug.
    pub fn create(&self, name: &str, dj_name: Option<&str>) -> Result<Arc<SessionSlot>, CoreError> {
        let name = validate_name(name)?;
        let dj_name = validate_dj_name(dj_name)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let slug = slug::generate_unique(|candidate| {
            match self.slugs.entry(candidate.to_string()) {
                Entry::Vacant(vacant) => {
                    vacant.insert(id);
                    true
                }
                Entry::Occupied(_) => false,
            }
        })?;

        let slot = Arc::new(SessionSlot::new(id, slug, name, dj_name));
        self.sessions.insert(id, Arc::clone(&slot));
        Ok(slot)
    }

    /// Look a session up by its audience slug.
    pub fn resolve(&self, slug: &str) -> Result<Arc<SessionSlot>, CoreError> {
        let not_found = || CoreError::NotFound {
            entity: "Session",
            key: slug.to_string(),
        };
        if !slug::is_valid_slug(slug) {
            return Err(not_found());
        }
        let id = *self.slugs.get(slug).ok_or_else(not_found)?;
        self.sessions
            .get(&id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or_else(not_found)
    }

    pub fn get(&self, id: DbId) -> Result<Arc<SessionSlot>, CoreError> {
        self.sessions
            .get(&id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or_else(|| CoreError::not_found("Session", id))
    }

    /// All sessions, newest first.
    pub fn all(&self) -> Vec<Arc<SessionSlot>> {
        let mut slots: Vec<_> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        slots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        slots
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
