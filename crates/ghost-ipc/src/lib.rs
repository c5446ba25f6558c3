//! IPC envelope and router (component C4): typed, versioned request/
//! response/status messages with inbound and outbound validation, and the
//! status bus status events travel over.

mod envelope;
mod error;
mod router;
mod status;
mod validate;

pub use envelope::{
    AxTreePayload, Envelope, InjectJsPayload, InputEventAction, InputEventPayload, IpcPayload,
    NavigatePayload, Point, QueueEventKind, QueueStatus, SchedulerEventKind, SchedulerStatus,
    ScreenshotPayload, StateStatus, SubtaskStatus, TaskErrorPayload, TaskResultPayload,
    TaskStatusPayload, SCHEMA_VERSION,
};
pub use error::IpcError;
pub use router::{route, IpcHandlers};
pub use status::{StatusBus, ThrottledStatusView};
pub use validate::{validate_inbound, validate_outbound};
