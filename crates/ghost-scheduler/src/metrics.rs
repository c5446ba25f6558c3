//! Thin prometheus wrappers for queue depth, dispatch latency, and
//! terminal outcomes. Recording functions are always safe to call;
//! [`register_metrics`] only needs to run once a registry exists to
//! export against.

use once_cell::sync::Lazy;
use prometheus::{histogram_opts, HistogramVec, IntCounterVec, Registry};
use tracing::error;

static TASKS_ENQUEUED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("ghost_scheduler_tasks_enqueued_total", "Tasks enqueued by priority"),
        &["priority"],
    )
    .expect("create enqueued counter")
});

static TASKS_FINALIZED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("ghost_scheduler_tasks_finalized_total", "Tasks reaching a terminal outcome"),
        &["outcome"],
    )
    .expect("create finalized counter")
});

static RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("ghost_scheduler_retries_total", "Retry attempts by trigger"),
        &["trigger"],
    )
    .expect("create retries counter")
});

static DISPATCH_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        histogram_opts!(
            "ghost_scheduler_dispatch_latency_ms",
            "Time from enqueue to a context lease being granted",
            vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
        ),
        &["priority"],
    )
    .expect("create dispatch latency histogram")
});

pub fn register_metrics(registry: &Registry) {
    register(registry, TASKS_ENQUEUED.clone());
    register(registry, TASKS_FINALIZED.clone());
    register(registry, RETRIES.clone());
    register(registry, DISPATCH_LATENCY_MS.clone());
}

fn register<C>(registry: &Registry, collector: C)
where
    C: prometheus::core::Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector)) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register scheduler metric");
        }
    }
}

pub fn record_enqueued(priority: &str) {
    TASKS_ENQUEUED.with_label_values(&[priority]).inc();
}

pub fn record_finalized(outcome: &str) {
    TASKS_FINALIZED.with_label_values(&[outcome]).inc();
}

pub fn record_retry(trigger: &str) {
    RETRIES.with_label_values(&[trigger]).inc();
}

pub fn observe_dispatch_latency_ms(priority: &str, ms: f64) {
    DISPATCH_LATENCY_MS.with_label_values(&[priority]).observe(ms);
}
