use std::time::Duration;

/// Default bounded wait for a session lock.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_millis(2000);

/// Tunables for [`QueueEngine`](crate::QueueEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long an operation waits for its session lock before failing
    /// with `Busy`.
    pub lock_wait: Duration,
    /// Per-session fan-out buffer; older notifications are dropped for
    /// subscribers that fall this far behind.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_wait: DEFAULT_LOCK_WAIT,
            event_capacity: encore_events::hub::DEFAULT_CAPACITY,
        }
    }
}
