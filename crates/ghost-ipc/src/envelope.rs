use chrono::{DateTime, Utc};
use ghost_core_types::{ContextId, ErrorDetail, MessageId, SubtaskId, TaskId};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub schema_version: u32,
    pub message_id: MessageId,
    pub task_id: TaskId,
    pub context_id: ContextId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: IpcPayload,
}

impl Envelope {
    pub fn new(task_id: TaskId, context_id: ContextId, payload: IpcPayload) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            message_id: MessageId::new(),
            task_id,
            context_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn operation(&self) -> &'static str {
        self.payload.operation()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum IpcPayload {
    #[serde(rename = "NAVIGATE")]
    Navigate(NavigatePayload),
    #[serde(rename = "SCREENSHOT")]
    Screenshot(ScreenshotPayload),
    #[serde(rename = "AX_TREE")]
    AxTree(AxTreePayload),
    #[serde(rename = "INJECT_JS")]
    InjectJs(InjectJsPayload),
    #[serde(rename = "INPUT_EVENT")]
    InputEvent(InputEventPayload),
    #[serde(rename = "TASK_RESULT")]
    TaskResult(TaskResultPayload),
    #[serde(rename = "TASK_ERROR")]
    TaskError(TaskErrorPayload),
    #[serde(rename = "TASK_STATUS")]
    TaskStatus(TaskStatusPayload),
}

impl IpcPayload {
    pub fn operation(&self) -> &'static str {
        match self {
            IpcPayload::Navigate(_) => "NAVIGATE",
            IpcPayload::Screenshot(_) => "SCREENSHOT",
            IpcPayload::AxTree(_) => "AX_TREE",
            IpcPayload::InjectJs(_) => "INJECT_JS",
            IpcPayload::InputEvent(_) => "INPUT_EVENT",
            IpcPayload::TaskResult(_) => "TASK_RESULT",
            IpcPayload::TaskError(_) => "TASK_ERROR",
            IpcPayload::TaskStatus(_) => "TASK_STATUS",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatePayload {
    pub url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotPayload {
    pub mode: String,
    pub quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxTreePayload {
    pub char_budget: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectJsPayload {
    pub expression: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputEventAction {
    Click,
    Type,
    Scroll,
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEventPayload {
    pub action: InputEventAction,
    pub target: Option<Point>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultPayload {
    pub success: bool,
    pub message: Option<String>,
    pub final_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskErrorPayload {
    pub operation: String,
    pub error: ErrorDetail,
    pub retryable: bool,
}

impl TaskErrorPayload {
    pub fn unknown(error: ErrorDetail) -> Self {
        Self { operation: "UNKNOWN".to_string(), retryable: false, error }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueEventKind {
    Enqueued,
    Dispatched,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulerEventKind {
    Started,
    Succeeded,
    Failed,
    CrashDetected,
    Retrying,
    ResourceBudgetExceeded,
    ResourceBudgetKilled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub event: QueueEventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateStatus {
    pub from: String,
    pub to: String,
    pub step: u32,
    pub url: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub event: SchedulerEventKind,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskStatus {
    pub subtask_id: SubtaskId,
    pub status: String,
    pub checkpoint_last_completed_subtask_index: i32,
}

impl From<ghost_task_state::StateTransitionEvent> for StateStatus {
    fn from(event: ghost_task_state::StateTransitionEvent) -> Self {
        Self {
            from: event.from.to_string(),
            to: event.to.to_string(),
            step: event.step,
            url: event.url,
            reason: event.reason,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TaskStatusPayload {
    #[serde(rename = "QUEUE")]
    Queue(QueueStatus),
    #[serde(rename = "STATE")]
    State(StateStatus),
    #[serde(rename = "SCHEDULER")]
    Scheduler(SchedulerStatus),
    #[serde(rename = "SUBTASK")]
    Subtask(SubtaskStatus),
}
