//! Context pool (component C2): a warm pool of isolated browser contexts
//! with lease/release, async replenishment, and a priority-then-FIFO
//! overflow queue.

mod error;
mod factory;
mod lease;
mod pool;
mod types;

pub use error::PoolError;
pub use factory::{ContextFactory, FakeContextFactory};
pub use lease::ContextLease;
pub use pool::ContextPool;
pub use types::{PoolConfig, PoolSnapshot};
