use crate::model::Decision;
use async_trait::async_trait;
use ghost_driver::NormalizedAxTree;
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Clone, thiserror::Error)]
#[error("reasoner call failed: {0}")]
pub struct ReasonerError(pub String);

/// Fast AX-tree-only reasoning. A real implementation calls a remote
/// text-only model; [`FakeReasoner`] replays a scripted decision queue.
#[async_trait]
pub trait Tier1Reasoner: Send + Sync {
    async fn decide(&self, ax_tree: &NormalizedAxTree, intent: &str) -> Result<Decision, ReasonerError>;
}

/// Vision-augmented reasoning: sees the AX tree plus a viewport screenshot.
#[async_trait]
pub trait Tier2Reasoner: Send + Sync {
    async fn decide(&self, ax_tree: &NormalizedAxTree, screenshot: &[u8], intent: &str) -> Result<Decision, ReasonerError>;
}

/// A scripted reasoner used by both tiers in tests: pops the next queued
/// decision, or returns an error once the queue is empty.
pub struct FakeReasoner {
    queue: Mutex<VecDeque<Decision>>,
}

impl FakeReasoner {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self { queue: Mutex::new(decisions.into_iter().collect()) }
    }

    pub fn push(&self, decision: Decision) {
        self.queue.lock().push_back(decision);
    }
}

#[async_trait]
impl Tier1Reasoner for FakeReasoner {
    async fn decide(&self, _ax_tree: &NormalizedAxTree, _intent: &str) -> Result<Decision, ReasonerError> {
        self.queue.lock().pop_front().ok_or_else(|| ReasonerError("no scripted decision left".into()))
    }
}

#[async_trait]
impl Tier2Reasoner for FakeReasoner {
    async fn decide(&self, _ax_tree: &NormalizedAxTree, _screenshot: &[u8], _intent: &str) -> Result<Decision, ReasonerError> {
        self.queue.lock().pop_front().ok_or_else(|| ReasonerError("no scripted decision left".into()))
    }
}
