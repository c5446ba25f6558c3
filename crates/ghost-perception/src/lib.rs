mod config;
mod dom_bypass;
mod engine;
pub mod metrics;
mod model;
mod reasoner;

pub use config::PerceptionConfig;
pub use dom_bypass::{parse_candidates, resolve as resolve_dom_bypass, DomCandidate};
pub use engine::PerceptionLoop;
pub use model::{
    Decision, EscalationEvent, EscalationReason, LoopOutcome, LoopStatus, RefetchReason,
    StepRecord, TierUsage, ESTIMATED_VISION_CALL_COST_USD,
};
pub use reasoner::{FakeReasoner, ReasonerError, Tier1Reasoner, Tier2Reasoner};
