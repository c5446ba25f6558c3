use ghost_core_types::Tier;
use ghost_driver::Action;

/// Why the AX tree was (or was not) refetched this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchReason {
    Initial,
    Navigation,
    SignificantDomMutation,
    ScrollAction,
    None,
}

impl RefetchReason {
    pub fn requires_refetch(&self) -> bool {
        !matches!(self, RefetchReason::None)
    }
}

/// Why Tier 1 escalated to Tier 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    AxDeficient,
    LowConfidence,
    UnsafeAction,
    NoProgress,
}

/// One tier's proposed action.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub confidence: f64,
    pub reasoning: String,
}

impl Decision {
    pub fn new(action: Action, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self { action, confidence, reasoning: reasoning.into() }
    }
}

/// Escalation is a first-class record, independent of the step it occurred
/// during.
#[derive(Debug, Clone)]
pub struct EscalationEvent {
    pub step: u32,
    pub reason: EscalationReason,
    pub source_tier: Tier,
    pub target_tier: Tier,
    pub url_at_escalation: String,
    pub confidence: Option<f64>,
    pub resolved_tier: Tier,
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStatus {
    Completed,
    Failed,
    MaxStepsReached,
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct TierUsage {
    pub tier1_count: u32,
    pub tier2_count: u32,
    pub tier3_scroll_count: u32,
    pub dom_bypass_resolutions: u32,
    pub low_confidence_escalations: u32,
    pub no_progress_escalations: u32,
    pub unsafe_action_escalations: u32,
    pub ax_deficient_detections: u32,
    pub estimated_vision_cost_avoided_usd: f64,
}

/// Estimated per-call vision model cost avoided by a successful DOM bypass.
pub const ESTIMATED_VISION_CALL_COST_USD: f64 = 0.012;

#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step_index: u32,
    pub url: String,
    pub tier: Tier,
    pub action_summary: String,
    pub confidence: Option<f64>,
    pub reasoning: String,
    pub interactive_element_count: usize,
    pub ax_deficient_detected: bool,
    pub scroll_y: f64,
    pub target_might_be_below_fold: bool,
    pub ax_tree_refetched: bool,
    pub ax_tree_refetch_reason: RefetchReason,
    pub post_action_significant_dom_mutation_observed: bool,
    pub dom_extraction_attempted: bool,
    pub dom_bypass_used: bool,
}

#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub status: LoopStatus,
    pub steps_taken: u32,
    pub history: Vec<StepRecord>,
    pub escalations: Vec<EscalationEvent>,
    pub tier_usage: TierUsage,
    pub final_url: Option<String>,
    pub error_message: Option<String>,
}
