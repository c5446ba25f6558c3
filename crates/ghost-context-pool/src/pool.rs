use crate::error::PoolError;
use crate::factory::ContextFactory;
use crate::lease::ContextLease;
use crate::types::{PoolConfig, PoolSnapshot, SlotState};
use dashmap::DashMap;
use ghost_core_types::{ContextId, Priority};
use ghost_driver::BrowserDriver;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

struct SlotRecord {
    state: SlotState,
    driver: Option<Arc<dyn BrowserDriver>>,
}

struct Waiter {
    priority: Priority,
    enqueued_at: Instant,
    responder: oneshot::Sender<(ContextId, Arc<dyn BrowserDriver>)>,
}

/// Warm pool of isolated browser contexts. See module docs in `lib.rs` for
/// the operations this implements.
pub struct ContextPool {
    config: PoolConfig,
    factory: Arc<dyn ContextFactory>,
    slot_ids: Vec<ContextId>,
    slots: DashMap<ContextId, Mutex<SlotRecord>>,
    waiters: Mutex<VecDeque<Waiter>>,
    self_weak: Weak<ContextPool>,
}

impl ContextPool {
    pub fn new(config: PoolConfig, factory: Arc<dyn ContextFactory>) -> Result<Arc<Self>, PoolError> {
        if config.capacity == 0 {
            return Err(PoolError::Misconfigured("capacity must be > 0".into()));
        }
        if config.warm_minimum > config.capacity {
            return Err(PoolError::Misconfigured("warm_minimum exceeds capacity".into()));
        }
        Ok(Arc::new_cyclic(|weak| {
            let slot_ids: Vec<ContextId> = (0..config.capacity).map(|_| ContextId::new()).collect();
            let slots = DashMap::new();
            for (i, id) in slot_ids.iter().enumerate() {
                let record = if i < config.warm_minimum {
                    SlotRecord { state: SlotState::Available, driver: Some(factory.create(id)) }
                } else {
                    SlotRecord { state: SlotState::Cold, driver: None }
                };
                slots.insert(id.clone(), Mutex::new(record));
            }
            Self {
                config,
                factory,
                slot_ids,
                slots,
                waiters: Mutex::new(VecDeque::new()),
                self_weak: weak.clone(),
            }
        }))
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let mut snap = PoolSnapshot::default();
        for id in &self.slot_ids {
            if let Some(slot) = self.slots.get(id) {
                match slot.lock().state {
                    SlotState::Available => snap.available += 1,
                    SlotState::InUse => snap.in_use += 1,
                    SlotState::Replenishing => snap.replenishing += 1,
                    SlotState::Cold => snap.cold += 1,
                }
            }
        }
        snap.queued = self.waiters.lock().len();
        snap
    }

    /// Leases a context, dispatching immediately if a slot is `Available`
    /// or enqueueing (ordered by priority then arrival) otherwise.
    pub async fn acquire(&self, priority: Priority) -> Result<ContextLease, PoolError> {
        if let Some((id, driver)) = self.try_take_available() {
            debug!(target: "pool", context_id = %id, "immediate dispatch");
            return Ok(ContextLease::new(id, driver));
        }
        self.maybe_start_replenish();
        let (tx, rx) = oneshot::channel();
        self.enqueue_waiter(Waiter { priority, enqueued_at: Instant::now(), responder: tx });
        let (id, driver) = rx.await.map_err(|_| PoolError::Closed)?;
        Ok(ContextLease::new(id, driver))
    }

    /// Releases a lease. `allow_replenish=true` tears the slot down and
    /// asynchronously warms a fresh context for it; `false` leaves the slot
    /// cold until an explicit `destroy`. Double-release is a no-op.
    pub fn release(&self, lease: ContextLease, allow_replenish: bool) {
        if !lease.mark_consumed() {
            return;
        }
        let id = lease.context_id.clone();
        drop(lease);
        if allow_replenish {
            if let Some(slot) = self.slots.get(&id) {
                let mut rec = slot.lock();
                rec.state = SlotState::Replenishing;
                rec.driver = None;
            }
            self.spawn_replenish(id);
        } else {
            if let Some(slot) = self.slots.get(&id) {
                let mut rec = slot.lock();
                rec.state = SlotState::Cold;
                rec.driver = None;
            }
            self.dispatch_queue();
        }
    }

    /// Forcibly tears a context down regardless of its current state (used
    /// for cancellation and crash recovery). Idempotent.
    pub fn destroy(&self, context_id: &ContextId, allow_replenish: bool) {
        let Some(slot) = self.slots.get(context_id) else {
            warn!(target: "pool", context_id = %context_id, "destroy of unknown slot");
            return;
        };
        {
            let mut rec = slot.lock();
            if rec.state == SlotState::Cold && rec.driver.is_none() {
                return;
            }
            rec.driver = None;
            rec.state = if allow_replenish { SlotState::Replenishing } else { SlotState::Cold };
        }
        if allow_replenish {
            self.spawn_replenish(context_id.clone());
        } else {
            self.dispatch_queue();
        }
    }

    fn try_take_available(&self) -> Option<(ContextId, Arc<dyn BrowserDriver>)> {
        for id in &self.slot_ids {
            if let Some(slot) = self.slots.get(id) {
                let mut rec = slot.lock();
                if rec.state == SlotState::Available {
                    rec.state = SlotState::InUse;
                    let driver = rec.driver.clone().expect("available slot always has a driver");
                    return Some((id.clone(), driver));
                }
            }
        }
        None
    }

    fn maybe_start_replenish(&self) {
        if !self.config.auto_replenish {
            return;
        }
        for id in &self.slot_ids {
            if let Some(slot) = self.slots.get(id) {
                let mut rec = slot.lock();
                if rec.state == SlotState::Cold {
                    rec.state = SlotState::Replenishing;
                    drop(rec);
                    self.spawn_replenish(id.clone());
                    return;
                }
            }
        }
    }

    fn spawn_replenish(&self, id: ContextId) {
        let factory = Arc::clone(&self.factory);
        let weak = self.self_weak.clone();
        tokio::spawn(async move {
            let driver = factory.create(&id);
            if let Some(pool) = weak.upgrade() {
                if let Some(slot) = pool.slots.get(&id) {
                    let mut rec = slot.lock();
                    rec.state = SlotState::Available;
                    rec.driver = Some(driver);
                }
                pool.dispatch_queue();
            }
        });
    }

    fn enqueue_waiter(&self, waiter: Waiter) {
        let mut queue = self.waiters.lock();
        let key = (waiter.priority.queue_rank(), waiter.enqueued_at);
        let pos = queue
            .iter()
            .position(|existing| key < (existing.priority.queue_rank(), existing.enqueued_at))
            .unwrap_or(queue.len());
        queue.insert(pos, waiter);
    }

    fn dispatch_queue(&self) {
        loop {
            let waiter = {
                let mut queue = self.waiters.lock();
                queue.pop_front()
            };
            let Some(waiter) = waiter else { return };
            match self.try_take_available() {
                Some((id, driver)) => {
                    if waiter.responder.send((id.clone(), driver)).is_err() {
                        // Waiter was cancelled before dispatch; give the slot back.
                        if let Some(slot) = self.slots.get(&id) {
                            slot.lock().state = SlotState::Available;
                        }
                        continue;
                    }
                    return;
                }
                None => {
                    self.waiters.lock().push_front(waiter);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FakeContextFactory;
    use std::time::Duration;

    fn pool(config: PoolConfig) -> Arc<ContextPool> {
        ContextPool::new(config, Arc::new(FakeContextFactory)).unwrap()
    }

    #[tokio::test]
    async fn acquire_dispatches_immediately_when_slot_available() {
        let pool = pool(PoolConfig { capacity: 2, warm_minimum: 2, auto_replenish: true });
        let lease = pool.acquire(Priority::Foreground).await.unwrap();
        let snap = pool.snapshot();
        assert_eq!(snap.in_use, 1);
        assert_eq!(snap.available, 1);
        pool.release(lease, false);
    }

    #[tokio::test]
    async fn foreground_waiter_preempts_earlier_background_waiter() {
        let pool = pool(PoolConfig { capacity: 1, warm_minimum: 1, auto_replenish: false });
        let lease = pool.acquire(Priority::Foreground).await.unwrap();
        assert_eq!(pool.snapshot().available, 0);

        let pool_bg = Arc::clone(&pool);
        let bg_task = tokio::spawn(async move { pool_bg.acquire(Priority::Background).await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let pool_fg = Arc::clone(&pool);
        let fg_task = tokio::spawn(async move { pool_fg.acquire(Priority::Foreground).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(pool.snapshot().queued, 2);

        pool.release(lease, false);

        let fg_lease = fg_task.await.unwrap().unwrap();
        assert_eq!(pool.snapshot().in_use, 1);
        pool.release(fg_lease, false);

        let bg_lease = bg_task.await.unwrap().unwrap();
        pool.release(bg_lease, false);
    }

    #[tokio::test]
    async fn release_with_replenish_eventually_restores_availability() {
        let pool = pool(PoolConfig { capacity: 1, warm_minimum: 1, auto_replenish: true });
        let lease = pool.acquire(Priority::Foreground).await.unwrap();
        pool.release(lease, true);
        for _ in 0..50 {
            if pool.snapshot().available == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(pool.snapshot().available, 1);
        assert_eq!(pool.snapshot().in_use, 0);
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        let pool = pool(PoolConfig { capacity: 1, warm_minimum: 1, auto_replenish: false });
        let id = pool.slot_ids[0].clone();
        pool.destroy(&id, false);
        pool.destroy(&id, false);
        assert_eq!(pool.snapshot().cold, 1);
    }

    #[tokio::test]
    async fn slot_counts_always_sum_to_capacity() {
        let pool = pool(PoolConfig { capacity: 4, warm_minimum: 1, auto_replenish: true });
        let snap = pool.snapshot();
        assert_eq!(snap.available + snap.in_use + snap.replenishing + snap.cold, 4);
    }
}
