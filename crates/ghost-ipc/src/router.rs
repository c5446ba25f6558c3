use crate::envelope::{
    AxTreePayload, Envelope, InjectJsPayload, InputEventPayload, IpcPayload, NavigatePayload,
    ScreenshotPayload, TaskErrorPayload, TaskResultPayload,
};
use crate::error::IpcError;
use crate::validate::validate_inbound;
use async_trait::async_trait;
use ghost_core_types::ErrorDetail;

/// One handler method per inbound request type. Routing dispatches on the
/// envelope's payload variant — an exhaustive match, never a string
/// comparison against a `type` field — so adding a request type without a
/// matching arm here is a compile error.
#[async_trait]
pub trait IpcHandlers: Send + Sync {
    async fn on_navigate(&self, task: &Envelope, req: &NavigatePayload) -> Result<TaskResultPayload, ErrorDetail>;
    async fn on_screenshot(&self, task: &Envelope, req: &ScreenshotPayload) -> Result<TaskResultPayload, ErrorDetail>;
    async fn on_ax_tree(&self, task: &Envelope, req: &AxTreePayload) -> Result<TaskResultPayload, ErrorDetail>;
    async fn on_inject_js(&self, task: &Envelope, req: &InjectJsPayload) -> Result<TaskResultPayload, ErrorDetail>;
    async fn on_input_event(&self, task: &Envelope, req: &InputEventPayload) -> Result<TaskResultPayload, ErrorDetail>;
}

fn malformed_response(envelope_hint: Option<&Envelope>, err: &IpcError) -> Envelope {
    let (task_id, context_id) = match envelope_hint {
        Some(e) => (e.task_id.clone(), e.context_id.clone()),
        None => (Default::default(), Default::default()),
    };
    let detail = ErrorDetail::new(err.kind(), err.to_string(), "ghost-ipc");
    Envelope::new(task_id, context_id, IpcPayload::TaskError(TaskErrorPayload::unknown(detail)))
}

/// Validates an inbound envelope, routes request payloads to `handlers`,
/// and returns the matching outbound response envelope. Response payloads
/// (`TASK_RESULT`/`TASK_ERROR`/`TASK_STATUS`) and malformed inbound
/// messages are returned as-is — this router only dispatches requests.
pub async fn route(envelope: Envelope, handlers: &dyn IpcHandlers) -> Envelope {
    if let Err(err) = validate_inbound(&envelope) {
        return malformed_response(Some(&envelope), &err);
    }

    let task_id = envelope.task_id.clone();
    let context_id = envelope.context_id.clone();
    let result = match &envelope.payload {
        IpcPayload::Navigate(req) => handlers.on_navigate(&envelope, req).await,
        IpcPayload::Screenshot(req) => handlers.on_screenshot(&envelope, req).await,
        IpcPayload::AxTree(req) => handlers.on_ax_tree(&envelope, req).await,
        IpcPayload::InjectJs(req) => handlers.on_inject_js(&envelope, req).await,
        IpcPayload::InputEvent(req) => handlers.on_input_event(&envelope, req).await,
        IpcPayload::TaskResult(_) | IpcPayload::TaskError(_) | IpcPayload::TaskStatus(_) => {
            return envelope;
        }
    };

    match result {
        Ok(payload) => Envelope::new(task_id, context_id, IpcPayload::TaskResult(payload)),
        Err(detail) => {
            let operation = envelope.operation();
            Envelope::new(
                task_id,
                context_id,
                IpcPayload::TaskError(TaskErrorPayload { operation: operation.to_string(), retryable: detail.retriable, error: detail }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use ghost_core_types::{ContextId, GhostErrorKind, TaskId};

    struct EchoHandlers;

    #[async_trait]
    impl IpcHandlers for EchoHandlers {
        async fn on_navigate(&self, _task: &Envelope, req: &NavigatePayload) -> Result<TaskResultPayload, ErrorDetail> {
            Ok(TaskResultPayload { success: true, message: None, final_url: Some(req.url.clone()) })
        }
        async fn on_screenshot(&self, _task: &Envelope, _req: &ScreenshotPayload) -> Result<TaskResultPayload, ErrorDetail> {
            Err(ErrorDetail::new(GhostErrorKind::Runtime, "not implemented", "test"))
        }
        async fn on_ax_tree(&self, _task: &Envelope, _req: &AxTreePayload) -> Result<TaskResultPayload, ErrorDetail> {
            Ok(TaskResultPayload { success: true, message: None, final_url: None })
        }
        async fn on_inject_js(&self, _task: &Envelope, _req: &InjectJsPayload) -> Result<TaskResultPayload, ErrorDetail> {
            Ok(TaskResultPayload { success: true, message: None, final_url: None })
        }
        async fn on_input_event(&self, _task: &Envelope, _req: &InputEventPayload) -> Result<TaskResultPayload, ErrorDetail> {
            Ok(TaskResultPayload { success: true, message: None, final_url: None })
        }
    }

    #[tokio::test]
    async fn navigate_routes_to_task_result() {
        let env = Envelope::new(
            TaskId::new(),
            ContextId::new(),
            IpcPayload::Navigate(NavigatePayload { url: "https://example.com".into(), timeout_ms: 1000 }),
        );
        let response = route(env, &EchoHandlers).await;
        match response.payload {
            IpcPayload::TaskResult(r) => assert_eq!(r.final_url.as_deref(), Some("https://example.com")),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn handler_error_becomes_task_error() {
        let env = Envelope::new(
            TaskId::new(),
            ContextId::new(),
            IpcPayload::Screenshot(ScreenshotPayload { mode: "viewport".into(), quality: 80 }),
        );
        let response = route(env, &EchoHandlers).await;
        match response.payload {
            IpcPayload::TaskError(e) => assert_eq!(e.operation, "SCREENSHOT"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_inbound_becomes_unknown_task_error() {
        let mut env = Envelope::new(
            TaskId::new(),
            ContextId::new(),
            IpcPayload::Navigate(NavigatePayload { url: String::new(), timeout_ms: 1000 }),
        );
        env.schema_version = 99;
        let response = route(env, &EchoHandlers).await;
        match response.payload {
            IpcPayload::TaskError(e) => {
                assert_eq!(e.operation, "UNKNOWN");
                assert!(!e.retryable);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
