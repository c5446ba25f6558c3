use crate::types::ResourceSample;
use async_trait::async_trait;
use dashmap::DashMap;
use ghost_core_types::ContextId;

/// Periodic per-context CPU/memory sampling. A real implementation reads
/// the driver's backing process; [`FakeResourceSampler`] returns scripted
/// readings for tests.
#[async_trait]
pub trait ResourceSampler: Send + Sync {
    async fn sample(&self, context_id: &ContextId) -> ResourceSample;
}

#[derive(Default)]
pub struct FakeResourceSampler {
    readings: DashMap<ContextId, ResourceSample>,
    default_reading: parking_lot::Mutex<Option<ResourceSample>>,
}

impl FakeResourceSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reading(&self, context_id: ContextId, sample: ResourceSample) {
        self.readings.insert(context_id, sample);
    }

    /// Reading returned for any context with no per-id override, useful when
    /// the context id isn't known until after the pool assigns it.
    pub fn set_default_reading(&self, sample: ResourceSample) {
        *self.default_reading.lock() = Some(sample);
    }
}

#[async_trait]
impl ResourceSampler for FakeResourceSampler {
    async fn sample(&self, context_id: &ContextId) -> ResourceSample {
        if let Some(sample) = self.readings.get(context_id).map(|r| *r) {
            return sample;
        }
        self.default_reading.lock().unwrap_or_default()
    }
}
