mod error;
pub mod metrics;
mod resource;
mod scheduler;
mod status;
mod types;

pub use error::SchedulerError;
pub use resource::{FakeResourceSampler, ResourceSampler};
pub use scheduler::Scheduler;
pub use types::{
    EnforcementMode, ResourceBudget, ResourceSample, ResultSnapshot, TaskOutcome, TaskSpec,
    TaskStatusView,
};
