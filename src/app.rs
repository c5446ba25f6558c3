use std::sync::Arc;

use ghost_context_pool::{ContextFactory, ContextPool, FakeContextFactory, PoolConfig};
use ghost_decomposer::SubtaskPlanner;
use ghost_ipc::StatusBus;
use ghost_perception::{Decision, FakeReasoner, Tier1Reasoner, Tier2Reasoner};
use ghost_scheduler::Scheduler;

use crate::config::GhostConfig;

/// Wires the nine components into one running orchestrator. The concrete
/// driver factory and reasoners are swappable: this binary only ships the
/// in-memory fakes that back the demo CLI and the test suite, same as
/// `ghost-driver`/`ghost-perception` document for their own fake types.
pub struct AppContext {
    pub config: GhostConfig,
    pub scheduler: Arc<Scheduler>,
    pub status_bus: Arc<StatusBus>,
}

impl AppContext {
    pub fn build(config: GhostConfig) -> Self {
        Self::build_with(
            config,
            Arc::new(FakeContextFactory),
            None,
            done_after_one_step(),
        )
    }

    pub fn build_with(
        config: GhostConfig,
        factory: Arc<dyn ContextFactory>,
        planner: Option<Arc<dyn SubtaskPlanner>>,
        reasoner: Arc<FakeReasoner>,
    ) -> Self {
        let pool_config = PoolConfig {
            capacity: config.context_count,
            warm_minimum: config.warm_minimum,
            auto_replenish: config.context_auto_replenish,
        };
        let pool = ContextPool::new(pool_config, factory).expect("pool config must be internally consistent");
        let status_bus = Arc::new(StatusBus::new(256));
        let sampler = Arc::new(ghost_scheduler::FakeResourceSampler::new());

        let tier1: Arc<dyn Tier1Reasoner> = reasoner.clone();
        let tier2: Arc<dyn Tier2Reasoner> = reasoner;
        let scheduler = Scheduler::new(
            pool,
            tier1,
            tier2,
            planner,
            sampler,
            config.perception_config(),
            Arc::clone(&status_bus),
        );

        Self { config, scheduler, status_bus }
    }
}

/// A reasoner that declares the task done on its very first decision --
/// enough to drive the demo CLI and a quick `submit` through the real
/// scheduler/pool/perception pipeline without a live browser or model.
fn done_after_one_step() -> Arc<FakeReasoner> {
    Arc::new(FakeReasoner::new(vec![Decision::new(ghost_driver::Action::Done, 0.95, "demo step")]))
}
