use ghost_core_types::{ContextId, TaskId};
use ghost_event_bus::Bus;
use ghost_ipc::{
    Envelope, IpcPayload, QueueEventKind, QueueStatus, SchedulerEventKind, SchedulerStatus,
    StatusBus, SubtaskStatus as IpcSubtaskStatus, TaskStatusPayload,
};

pub fn emit_queue(bus: &StatusBus, task_id: &TaskId, context_id: &ContextId, event: QueueEventKind) {
    let payload = IpcPayload::TaskStatus(TaskStatusPayload::Queue(QueueStatus { event }));
    bus.publish(Envelope::new(task_id.clone(), context_id.clone(), payload));
}

pub fn emit_scheduler(bus: &StatusBus, task_id: &TaskId, context_id: &ContextId, event: SchedulerEventKind, detail: Option<String>) {
    let payload = IpcPayload::TaskStatus(TaskStatusPayload::Scheduler(SchedulerStatus { event, detail }));
    bus.publish(Envelope::new(task_id.clone(), context_id.clone(), payload));
}

pub fn emit_subtask(
    bus: &StatusBus,
    task_id: &TaskId,
    context_id: &ContextId,
    subtask_id: ghost_core_types::SubtaskId,
    status: &str,
    checkpoint_last_completed_subtask_index: i64,
) {
    let payload = IpcPayload::TaskStatus(TaskStatusPayload::Subtask(IpcSubtaskStatus {
        subtask_id,
        status: status.to_string(),
        checkpoint_last_completed_subtask_index: checkpoint_last_completed_subtask_index as i32,
    }));
    bus.publish(Envelope::new(task_id.clone(), context_id.clone(), payload));
}
