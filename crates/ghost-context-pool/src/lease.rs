use ghost_core_types::ContextId;
use ghost_driver::BrowserDriver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Exclusive capability to use one pooled context for the duration of a
/// single task attempt. Dropping a lease without releasing it leaks the
/// slot as `InUse` forever — callers must always pair `acquire` with
/// `release` or `destroy`, typically in the scheduler's attempt cleanup.
pub struct ContextLease {
    pub context_id: ContextId,
    pub acquired_at: Instant,
    pub(crate) driver: Arc<dyn BrowserDriver>,
    pub(crate) consumed: Arc<AtomicBool>,
}

impl ContextLease {
    pub(crate) fn new(context_id: ContextId, driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            context_id,
            acquired_at: Instant::now(),
            driver,
            consumed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Marks the lease consumed, returning `true` the first time and `false`
    /// on any subsequent call — the no-op half of "double-release is a
    /// no-op".
    pub(crate) fn mark_consumed(&self) -> bool {
        !self.consumed.swap(true, Ordering::SeqCst)
    }
}
