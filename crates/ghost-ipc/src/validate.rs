use crate::envelope::{Envelope, IpcPayload, TaskStatusPayload, SCHEMA_VERSION};
use crate::error::IpcError;

fn validate_headers(envelope: &Envelope) -> Result<(), IpcError> {
    if envelope.schema_version != SCHEMA_VERSION {
        return Err(IpcError::InvalidHeader(format!(
            "schema_version {} does not match {}",
            envelope.schema_version, SCHEMA_VERSION
        )));
    }
    if envelope.message_id.as_str().is_empty() {
        return Err(IpcError::InvalidHeader("message_id is empty".into()));
    }
    if envelope.task_id.as_str().is_empty() {
        return Err(IpcError::InvalidHeader("task_id is empty".into()));
    }
    if envelope.context_id.as_str().is_empty() {
        return Err(IpcError::InvalidHeader("context_id is empty".into()));
    }
    Ok(())
}

fn validate_payload(payload: &IpcPayload) -> Result<(), IpcError> {
    match payload {
        IpcPayload::Navigate(p) => {
            if p.url.is_empty() {
                return Err(IpcError::InvalidPayload { operation: "NAVIGATE", detail: "url is empty".into() });
            }
        }
        IpcPayload::Screenshot(p) => {
            if p.quality > 100 {
                return Err(IpcError::InvalidPayload {
                    operation: "SCREENSHOT",
                    detail: format!("quality {} out of range 0-100", p.quality),
                });
            }
        }
        IpcPayload::InputEvent(p) => {
            if !(0.0..=1.0).contains(&p.confidence) {
                return Err(IpcError::InvalidPayload {
                    operation: "INPUT_EVENT",
                    detail: format!("confidence {} out of range 0-1", p.confidence),
                });
            }
        }
        IpcPayload::TaskStatus(TaskStatusPayload::Subtask(s)) => {
            if s.checkpoint_last_completed_subtask_index < -1 {
                return Err(IpcError::InvalidPayload {
                    operation: "TASK_STATUS",
                    detail: "checkpointLastCompletedSubtaskIndex must be >= -1".into(),
                });
            }
        }
        IpcPayload::AxTree(_)
        | IpcPayload::InjectJs(_)
        | IpcPayload::TaskResult(_)
        | IpcPayload::TaskError(_)
        | IpcPayload::TaskStatus(_) => {}
    }
    Ok(())
}

/// Run before a message leaves the producer.
pub fn validate_outbound(envelope: &Envelope) -> Result<(), IpcError> {
    validate_headers(envelope)?;
    validate_payload(&envelope.payload)
}

/// Run before a message is dispatched to a consumer.
pub fn validate_inbound(envelope: &Envelope) -> Result<(), IpcError> {
    validate_headers(envelope)?;
    validate_payload(&envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Envelope, NavigatePayload};
    use ghost_core_types::{ContextId, TaskId};

    #[test]
    fn valid_navigate_envelope_round_trips_validation() {
        let env = Envelope::new(
            TaskId::new(),
            ContextId::new(),
            IpcPayload::Navigate(NavigatePayload { url: "https://example.com".into(), timeout_ms: 5000 }),
        );
        assert!(validate_outbound(&env).is_ok());
        assert!(validate_inbound(&env).is_ok());
    }

    #[test]
    fn empty_navigate_url_is_rejected() {
        let env = Envelope::new(
            TaskId::new(),
            ContextId::new(),
            IpcPayload::Navigate(NavigatePayload { url: String::new(), timeout_ms: 5000 }),
        );
        assert!(validate_outbound(&env).is_err());
    }

    #[test]
    fn schema_version_mismatch_is_rejected() {
        let mut env = Envelope::new(
            TaskId::new(),
            ContextId::new(),
            IpcPayload::Navigate(NavigatePayload { url: "https://example.com".into(), timeout_ms: 5000 }),
        );
        env.schema_version = 2;
        assert!(validate_inbound(&env).is_err());
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        use crate::envelope::{InputEventAction, InputEventPayload};
        let env = Envelope::new(
            TaskId::new(),
            ContextId::new(),
            IpcPayload::InputEvent(InputEventPayload {
                action: InputEventAction::Click,
                target: None,
                confidence: 1.5,
            }),
        );
        assert!(validate_outbound(&env).is_err());
    }
}
