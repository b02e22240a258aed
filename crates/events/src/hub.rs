//! Per-session fan-out backed by `tokio::sync::broadcast` channels.
//!
//! [`SessionHub`] keeps one broadcast channel per session. Publishing never
//! blocks: when a subscriber's buffer is full the oldest pending events are
//! overwritten and that subscriber observes [`Delivery::Lagged`]. Closing a
//! session drops its sender, so every live [`Subscription`] drains what is
//! buffered and then ends.

use dashmap::DashMap;
use encore_core::error::CoreError;
use encore_core::types::DbId;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::event::QueueEvent;

/// Default per-session buffer capacity.
pub const DEFAULT_CAPACITY: usize = 64;

enum Channel {
    Open(broadcast::Sender<QueueEvent>),
    /// The session ended; no further subscriptions are accepted.
    Closed,
}

pub struct SessionHub {
    channels: DashMap<DbId, Channel>,
    capacity: usize,
}

impl SessionHub {
    /// Create a hub whose per-session buffers hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to a session's events.
    ///
    /// Fails with [`CoreError::SessionClosed`] once the session was closed.
    pub fn subscribe(&self, session_id: DbId) -> Result<Subscription, CoreError> {
        let entry = self
            .channels
            .entry(session_id)
            .or_insert_with(|| Channel::Open(broadcast::channel(self.capacity).0));

        match entry.value() {
            Channel::Open(sender) => Ok(Subscription {
                session_id,
                receiver: sender.subscribe(),
            }),
            Channel::Closed => Err(CoreError::SessionClosed { session_id }),
        }
    }

    /// Publish an event to the subscribers of `event.session_id`.
    ///
    /// Best-effort: returns the number of subscribers the event was queued
    /// for, which is zero when nobody is listening.
    pub fn publish(&self, event: QueueEvent) -> usize {
        let session_id = event.session_id;
        let kind = event.kind;
        let delivered = match self.channels.get(&session_id).as_deref() {
            Some(Channel::Open(sender)) => sender.send(event).unwrap_or(0),
            _ => 0,
        };
        tracing::trace!(session_id, kind = kind.as_str(), delivered, "Queue event published");
        delivered
    }

    /// Close a session's channel. Returns how many subscribers were attached.
    ///
    /// Idempotent; closing an already-closed session returns 0.
    pub fn close(&self, session_id: DbId) -> usize {
        match self.channels.insert(session_id, Channel::Closed) {
            Some(Channel::Open(sender)) => sender.receiver_count(),
            _ => 0,
        }
    }

    pub fn is_closed(&self, session_id: DbId) -> bool {
        matches!(
            self.channels.get(&session_id).as_deref(),
            Some(Channel::Closed)
        )
    }

    /// Number of live subscriptions for a session.
    pub fn subscriber_count(&self, session_id: DbId) -> usize {
        match self.channels.get(&session_id).as_deref() {
            Some(Channel::Open(sender)) => sender.receiver_count(),
            _ => 0,
        }
    }

    /// Drop open channels that have no subscribers left. Returns how many
    /// were removed. Closed markers are kept.
    pub fn prune(&self) -> usize {
        let before = self.channels.len();
        self.channels.retain(|_, channel| match channel {
            Channel::Open(sender) => sender.receiver_count() > 0,
            Channel::Closed => true,
        });
        before - self.channels.len()
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// What a subscriber sees next.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Event(QueueEvent),
    /// This many events were dropped because the subscriber fell behind.
    Lagged(u64),
}

/// A live subscription to one session. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    session_id: DbId,
    receiver: broadcast::Receiver<QueueEvent>,
}

impl Subscription {
    pub fn session_id(&self) -> DbId {
        self.session_id
    }

    /// Wait for the next delivery. `None` once the session was closed and the
    /// buffer is drained.
    pub async fn next(&mut self) -> Option<Delivery> {
        match self.receiver.recv().await {
            Ok(event) => Some(Delivery::Event(event)),
            Err(RecvError::Lagged(skipped)) => Some(Delivery::Lagged(skipped)),
            Err(RecvError::Closed) => None,
        }
    }
}
