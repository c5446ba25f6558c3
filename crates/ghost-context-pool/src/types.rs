#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub capacity: usize,
    pub warm_minimum: usize,
    pub auto_replenish: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: 6, warm_minimum: 2, auto_replenish: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    Available,
    InUse,
    Replenishing,
    Cold,
}

/// A point-in-time view of slot occupancy. `available + in_use +
/// replenishing + cold == capacity`; `queued` is independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSnapshot {
    pub available: usize,
    pub in_use: usize,
    pub replenishing: usize,
    pub cold: usize,
    pub queued: usize,
}
