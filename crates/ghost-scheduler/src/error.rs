#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulerError {
    #[error("task {0} not found")]
    TaskNotFound(String),
}
