use ghost_core_types::ContextId;
use ghost_driver::{BrowserDriver, FakeBrowserDriver};
use std::sync::Arc;

/// Creates a fresh driver instance for a pool slot. Each call must produce a
/// context with empty storage, even when `context_id` was used before.
pub trait ContextFactory: Send + Sync {
    fn create(&self, context_id: &ContextId) -> Arc<dyn BrowserDriver>;
}

/// Builds [`FakeBrowserDriver`]s, used by tests and the `run-demo` CLI
/// command where no real Chromium transport is wired in.
pub struct FakeContextFactory;

impl ContextFactory for FakeContextFactory {
    fn create(&self, context_id: &ContextId) -> Arc<dyn BrowserDriver> {
        Arc::new(FakeBrowserDriver::new(context_id.clone()))
    }
}
