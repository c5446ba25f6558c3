//! Thin prometheus wrappers for tier usage and step throughput. Safe to
//! call with no registry ever wired in: the counters just accumulate
//! in-process and are only exported once something calls
//! [`register_metrics`].

use once_cell::sync::Lazy;
use prometheus::{histogram_opts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};
use tracing::error;

static TIER_DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ghost_perception_tier_decisions_total", "Decisions made per reasoning tier"),
        &["tier"],
    )
    .expect("create tier decisions counter")
});

static ESCALATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ghost_perception_escalations_total", "Tier escalations by reason"),
        &["reason"],
    )
    .expect("create escalations counter")
});

static DOM_BYPASS_RESOLUTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ghost_perception_dom_bypass_resolutions_total", "Decisions resolved via DOM bypass")
        .expect("create dom bypass counter")
});

static LOOP_STEPS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        histogram_opts!(
            "ghost_perception_loop_steps",
            "Steps taken per completed perception-action loop",
            vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 20.0, 30.0]
        ),
        &["status"],
    )
    .expect("create loop steps histogram")
});

pub fn register_metrics(registry: &Registry) {
    register(registry, TIER_DECISIONS.clone());
    register(registry, ESCALATIONS.clone());
    register(registry, DOM_BYPASS_RESOLUTIONS.clone());
    register(registry, LOOP_STEPS.clone());
}

fn register<C>(registry: &Registry, collector: C)
where
    C: prometheus::core::Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector)) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register perception metric");
        }
    }
}

pub fn record_tier_decision(tier: &str) {
    TIER_DECISIONS.with_label_values(&[tier]).inc();
}

pub fn record_escalation(reason: &str) {
    ESCALATIONS.with_label_values(&[reason]).inc();
}

pub fn record_dom_bypass_resolution() {
    DOM_BYPASS_RESOLUTIONS.inc();
}

pub fn observe_loop_steps(status: &str, steps: u32) {
    LOOP_STEPS.with_label_values(&[status]).observe(steps as f64);
}
