//! Request entity store for a single session.
//!
//! A [`SessionQueue`] is only reachable through its session's lock (see
//! [`crate::registry::SessionSlot`]), so every method here runs inside one
//! critical section and never observes a half-applied position update.

use std::cmp::Ordering;
use std::collections::HashMap;

use encore_core::error::CoreError;
use encore_core::models::request::{NewRequest, Request};
use encore_core::ordering::QueueOrder;
use encore_core::status::RequestStatus;
use encore_core::types::{DbId, Timestamp};

#[derive(Debug)]
pub struct SessionQueue {
    session_id: DbId,
    /// Every request ever submitted, in submission order.
    requests: Vec<Request>,
    /// Request id -> index into `requests`.
    index: HashMap<DbId, usize>,
    /// Orderable requests in position order.
    order: QueueOrder,
}

impl SessionQueue {
    pub fn new(session_id: DbId) -> Self {
        Self {
            session_id,
            requests: Vec::new(),
            index: HashMap::new(),
            order: QueueOrder::new(),
        }
    }

    pub fn session_id(&self) -> DbId {
        self.session_id
    }

    /// Store a new pending request at the tail of the queue.
    pub fn insert(&mut self, id: DbId, new: NewRequest, created_at: Timestamp) -> &Request {
        let position = self.order.append(id);
        self.index.insert(id, self.requests.len());
        self.requests.push(Request {
            id,
            session_id: self.session_id,
            guest_name: new.guest_name,
            song_title: new.song_title,
            artist: new.artist,
            note: new.note,
            status: RequestStatus::Pending,
            position,
            tip_amount: new.tip_amount,
            votes: 0,
            created_at,
        });
        &self.requests[self.requests.len() - 1]
    }

    pub fn get(&self, id: DbId) -> Option<&Request> {
        self.index.get(&id).map(|&idx| &self.requests[idx])
    }

    /// Fetch a request or fail with `NotFound`.
    pub fn require(&self, id: DbId) -> Result<&Request, CoreError> {
        self.get(id).ok_or_else(|| CoreError::not_found("Request", id))
    }

    /// Apply `mutator` to a request's plain fields (votes and the like).
    ///
    /// The mutator works on a copy that is committed only when it returns
    /// `Ok`. Status and position are kept as stored: they only change through
    /// [`set_status`](Self::set_status) and [`reposition`](Self::reposition).
    pub fn update<F>(&mut self, id: DbId, mutator: F) -> Result<&Request, CoreError>
    where
        F: FnOnce(&mut Request) -> Result<(), CoreError>,
    {
        let idx = *self
            .index
            .get(&id)
            .ok_or_else(|| CoreError::not_found("Request", id))?;
        let current = &self.requests[idx];
        let mut draft = current.clone();
        mutator(&mut draft)?;
        draft.id = id;
        draft.session_id = self.session_id;
        draft.status = current.status;
        draft.position = current.position;
        self.requests[idx] = draft;
        Ok(&self.requests[idx])
    }

    /// Requests ordered by position (orderable first), then terminal requests
    /// by submission time.
    pub fn list(&self, status: Option<RequestStatus>) -> Vec<Request> {
        let mut items: Vec<Request> = self
            .requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        items.sort_by(list_order);
        items
    }

    /// Total number of requests, terminal ones included.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Number of requests in the dense position sequence.
    pub fn orderable_count(&self) -> usize {
        self.order.len()
    }

    /// The request currently playing, if any.
    pub fn playing(&self) -> Option<DbId> {
        self.order
            .ids()
            .iter()
            .copied()
            .find(|&id| self.get(id).is_some_and(|r| r.status == RequestStatus::Playing))
    }

    /// Write a new status. Terminal statuses leave the position sequence and
    /// the requests behind them move up by one. Legality is the caller's job.
    pub(crate) fn set_status(&mut self, id: DbId, status: RequestStatus) -> Result<(), CoreError> {
        let idx = *self
            .index
            .get(&id)
            .ok_or_else(|| CoreError::not_found("Request", id))?;
        self.requests[idx].status = status;
        if status.is_terminal() {
            self.order.remove(id);
            self.sync_positions();
        }
        Ok(())
    }

    /// Move an orderable request to `position` (clamped to `[1, N]`).
    pub fn reposition(&mut self, id: DbId, position: i64) -> Result<&Request, CoreError> {
        self.require(id)?;
        self.order.reposition(id, position)?;
        self.sync_positions();
        self.require(id)
    }

    /// Copy the sequence positions onto the orderable requests.
    fn sync_positions(&mut self) {
        for (id, position) in self.order.positions() {
            if let Some(&idx) = self.index.get(&id) {
                self.requests[idx].position = position;
            }
        }
        debug_assert!(self.check_invariants().is_ok());
    }

    /// Verify the dense ordering and single-playing invariants.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut positions: Vec<i32> = self
            .requests
            .iter()
            .filter(|r| r.status.is_orderable())
            .map(|r| r.position)
            .collect();
        positions.sort_unstable();
        let expected: Vec<i32> = (1..=positions.len() as i32).collect();
        if positions != expected {
            return Err(format!(
                "session {}: positions {positions:?} are not 1..={}",
                self.session_id,
                expected.len()
            ));
        }
        if positions.len() != self.order.len() {
            return Err(format!(
                "session {}: order tracks {} requests, {} are orderable",
                self.session_id,
                self.order.len(),
                positions.len()
            ));
        }
        let playing = self
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Playing)
            .count();
        if playing > 1 {
            return Err(format!(
                "session {}: {playing} requests are playing",
                self.session_id
            ));
        }
        Ok(())
    }
}

fn list_order(a: &Request, b: &Request) -> Ordering {
    match (a.status.is_orderable(), b.status.is_orderable()) {
        (true, true) => a.position.cmp(&b.position),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
    }
}
