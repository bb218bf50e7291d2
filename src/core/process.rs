use crate::core::engine::{CutFrameEngine, InFlight};
use crate::core::renderer;
use crate::core::state::Completion;
use crate::domain::model::{HttpReply, ProcessedResult, WorkflowPhase};
use crate::domain::notification::Notification;
use crate::domain::ports::{CuttingApi, Presenter, Storage};
use crate::utils::error::{CutFrameError, Result};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

pub const FALLBACK_FAILURE_MESSAGE: &str = "processing failed";
pub const INVALID_RESULT_MESSAGE: &str = "invalid processing result";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The service answered with a non-2xx status.
    Transport { status: u16 },
    /// The service answered 2xx but refused the job or sent something unusable.
    Application,
    /// No answer at all (connection refused, DNS, reset, ...).
    Unreachable,
}

/// An expected way for a remote call to fail. Ends the attempt, not the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProcessFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ProcessFailure {
    pub fn transport(status: u16) -> Self {
        Self {
            kind: FailureKind::Transport { status },
            message: format!("HTTP error! status: {}", status),
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Application,
            message: message.into(),
        }
    }

    pub fn unreachable(error: &CutFrameError) -> Self {
        Self {
            kind: FailureKind::Unreachable,
            message: error.to_string(),
        }
    }

    pub fn into_error(self) -> CutFrameError {
        match self.kind {
            FailureKind::Transport { status } => CutFrameError::TransportError { status },
            FailureKind::Application | FailureKind::Unreachable => {
                CutFrameError::ApplicationError {
                    message: self.message,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Completed(Arc<ProcessedResult>),
    Failed(ProcessFailure),
    /// A request was already in flight; nothing was sent.
    AlreadyProcessing,
    /// A newer file or submit replaced this request before its reply arrived.
    Superseded,
}

#[derive(Debug, Deserialize)]
struct ProcessEnvelope {
    #[serde(default)]
    success: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl ProcessEnvelope {
    fn is_success(&self) -> bool {
        matches!(self.success, Some(serde_json::Value::Bool(true)))
    }

    fn failure_message(&self) -> String {
        self.message
            .as_ref()
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(FALLBACK_FAILURE_MESSAGE)
            .to_string()
    }
}

/// Success needs a 2xx status, a JSON body, `success: true` and a `data.rows`
/// array. Everything else is a failure.
pub fn interpret_process_reply(
    reply: &HttpReply,
) -> std::result::Result<ProcessedResult, ProcessFailure> {
    if !reply.is_success() {
        return Err(ProcessFailure::transport(reply.status));
    }

    let envelope: ProcessEnvelope = serde_json::from_slice(&reply.body).map_err(|e| {
        tracing::debug!("Process reply is not valid JSON: {}", e);
        ProcessFailure::application(INVALID_RESULT_MESSAGE)
    })?;

    if !envelope.is_success() {
        return Err(ProcessFailure::application(envelope.failure_message()));
    }

    let data = envelope
        .data
        .ok_or_else(|| ProcessFailure::application(INVALID_RESULT_MESSAGE))?;

    serde_json::from_value::<ProcessedResult>(data).map_err(|e| {
        tracing::debug!("Process reply data is malformed: {}", e);
        ProcessFailure::application(INVALID_RESULT_MESSAGE)
    })
}

impl<A: CuttingApi, S: Storage, P: Presenter> CutFrameEngine<A, S, P> {
    /// Sends the held file with the currently selected process type.
    ///
    /// Without a file this reports a [`Notification::UserError`] and returns the
    /// precondition error. While a request is in flight it does nothing, also
    /// when a newer file was selected after that request went out.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let _in_flight = match InFlight::acquire(&self.process_in_flight) {
            Some(guard) => guard,
            None => {
                tracing::info!("Submit ignored, a processing request is already in flight");
                return Ok(SubmitOutcome::AlreadyProcessing);
            }
        };
        let process_type = self.process_type().await;

        let ticket = {
            let mut state = self.state.lock().await;
            match state.begin_processing() {
                Ok(ticket) => ticket,
                Err(CutFrameError::InvalidTransition {
                    from: WorkflowPhase::Processing,
                    ..
                }) => {
                    tracing::info!("Submit ignored, a processing request is already in flight");
                    return Ok(SubmitOutcome::AlreadyProcessing);
                }
                Err(e @ CutFrameError::Precondition(_)) => {
                    tracing::warn!("Submit refused: {}", e);
                    self.presenter.notify(Notification::UserError {
                        message: e.to_string(),
                    });
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        };

        self.notify_phase(WorkflowPhase::Processing, None);
        tracing::info!(
            "Submitting {} ({} bytes) as {}",
            ticket.file.name(),
            ticket.file.size(),
            process_type
        );

        let interpreted = match self.api.process(&ticket.file, process_type).await {
            Ok(reply) => {
                tracing::debug!("Process reply status: {}", reply.status);
                interpret_process_reply(&reply)
            }
            Err(e) => {
                tracing::error!("Processing request did not complete: {}", e);
                Err(ProcessFailure::unreachable(&e))
            }
        };

        let failure = interpreted.as_ref().err().cloned();
        let (completion, result) = {
            let mut state = self.state.lock().await;
            let completion = state.finish_processing(ticket.epoch, interpreted)?;
            (completion, state.result().cloned())
        };

        match (completion, failure) {
            (Completion::Stale, _) => {
                tracing::warn!(
                    "Discarding reply for {}, it was superseded",
                    ticket.file.name()
                );
                Ok(SubmitOutcome::Superseded)
            }
            (Completion::Applied(_), Some(failure)) => {
                tracing::warn!("Processing failed: {}", failure);
                let detail = format!("Error processing file: {}", failure);
                self.notify_phase(WorkflowPhase::Failed, Some(&detail));
                Ok(SubmitOutcome::Failed(failure))
            }
            (Completion::Applied(phase), None) => match result {
                Some(result) => {
                    tracing::info!("Processing succeeded with {} rows", result.rows.len());
                    self.notify_phase(phase, None);
                    self.presenter
                        .notify(Notification::ResultReady(renderer::render(&result)));
                    Ok(SubmitOutcome::Completed(result))
                }
                None => Err(CutFrameError::ApplicationError {
                    message: INVALID_RESULT_MESSAGE.to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{candidate, harness, Gate, MockApi};
    use crate::utils::error::PreconditionError;
    use serde_json::json;

    #[test]
    fn test_interpret_success() {
        let reply = HttpReply::json(
            200,
            &json!({
                "success": true,
                "data": {"rows": [{"a": 1}], "materialTypes": 1, "maxCuttingId": 2, "totalLength": 150.5}
            }),
        );
        let result = interpret_process_reply(&reply).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.material_types, Some(1));
        assert_eq!(result.max_cutting_id, Some(2));
        assert_eq!(result.total_length, Some(150.5));
    }

    #[test]
    fn test_interpret_non_ok_status() {
        let reply = HttpReply::json(400, &json!({"success": false, "message": "No file uploaded"}));
        let failure = interpret_process_reply(&reply).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Transport { status: 400 });
        assert_eq!(failure.message, "HTTP error! status: 400");
    }

    #[test]
    fn test_interpret_explicit_failure_uses_service_message() {
        let reply = HttpReply::json(200, &json!({"success": false, "message": "sheet has no rows"}));
        let failure = interpret_process_reply(&reply).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Application);
        assert_eq!(failure.message, "sheet has no rows");
    }

    #[test]
    fn test_interpret_failure_without_message_uses_fallback() {
        for body in [json!({"success": false}), json!({"success": false, "message": ""})] {
            let failure = interpret_process_reply(&HttpReply::json(200, &body)).unwrap_err();
            assert_eq!(failure.message, FALLBACK_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn test_interpret_requires_boolean_true() {
        let reply = HttpReply::json(200, &json!({"success": "yes", "data": {"rows": []}}));
        assert!(interpret_process_reply(&reply).is_err());
    }

    #[test]
    fn test_interpret_malformed_payloads() {
        let bodies = [
            json!({"success": true}),
            json!({"success": true, "data": {}}),
            json!({"success": true, "data": {"rows": null}}),
            json!({"success": true, "data": {"rows": "nope"}}),
        ];
        for body in bodies {
            let failure = interpret_process_reply(&HttpReply::json(200, &body)).unwrap_err();
            assert_eq!(failure.message, INVALID_RESULT_MESSAGE);
        }

        let not_json = HttpReply::new(200, "<html>oops</html>");
        assert_eq!(
            interpret_process_reply(&not_json).unwrap_err().kind,
            FailureKind::Application
        );
    }

    #[tokio::test]
    async fn test_submit_without_file_sends_nothing() {
        let (engine, api, presenter) = harness(MockApi::new());

        let err = engine.submit().await.unwrap_err();

        assert!(matches!(
            err,
            CutFrameError::Precondition(PreconditionError::NoFile)
        ));
        assert_eq!(api.process_calls(), 0);
        assert_eq!(engine.phase().await, WorkflowPhase::Idle);
        assert!(presenter
            .notifications()
            .iter()
            .any(|n| matches!(n, Notification::UserError { .. })));
    }

    #[tokio::test]
    async fn test_submit_success_reaches_succeeded() {
        let api = MockApi::new().with_process_reply(Ok(HttpReply::json(
            200,
            &json!({"success": true, "data": {"rows": [{"a": 1}, {"a": 2}]}}),
        )));
        let (engine, api, presenter) = harness(api);
        engine.select_file(candidate("plan.xlsx", 2048)).await.unwrap();

        let outcome = engine.submit().await.unwrap();

        match outcome {
            SubmitOutcome::Completed(result) => assert_eq!(result.rows.len(), 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(engine.phase().await, WorkflowPhase::Succeeded);
        assert_eq!(api.process_calls(), 1);
        assert!(presenter
            .notifications()
            .iter()
            .any(|n| matches!(n, Notification::ResultReady(_))));
    }

    #[tokio::test]
    async fn test_submit_failures_reach_failed() {
        let replies = [
            Ok(HttpReply::json(500, &json!({"success": true, "data": {"rows": []}}))),
            Ok(HttpReply::json(200, &json!({"success": false}))),
            Ok(HttpReply::json(200, &json!({"success": true, "data": {}}))),
            Err(CutFrameError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        ];

        for reply in replies {
            let (engine, _api, _presenter) = harness(MockApi::new().with_process_reply(reply));
            engine.select_file(candidate("plan.xlsx", 2048)).await.unwrap();

            let outcome = engine.submit().await.unwrap();

            assert!(matches!(outcome, SubmitOutcome::Failed(_)));
            assert_eq!(engine.phase().await, WorkflowPhase::Failed);
            assert!(engine.processed_result().await.is_none());
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_its_own_kind() {
        let api = MockApi::new().with_process_reply(Err(CutFrameError::IoError(
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
        )));
        let (engine, _api, _presenter) = harness(api);
        engine.select_file(candidate("plan.xlsx", 10)).await.unwrap();

        match engine.submit().await.unwrap() {
            SubmitOutcome::Failed(failure) => assert_eq!(failure.kind, FailureKind::Unreachable),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_submit_while_processing_is_a_no_op() {
        let gate = Gate::new();
        let api = MockApi::new()
            .with_process_gate(gate.clone())
            .with_process_reply(Ok(HttpReply::json(
                200,
                &json!({"success": true, "data": {"rows": [{"a": 1}]}}),
            )));
        let (engine, api, _presenter) = harness(api);
        engine.select_file(candidate("plan.xlsx", 10)).await.unwrap();

        let (first, second) = tokio::join!(engine.submit(), async {
            while engine.phase().await != WorkflowPhase::Processing {
                tokio::task::yield_now().await;
            }
            let file_before = engine.uploaded_file().await;
            let outcome = engine.submit().await;
            assert_eq!(engine.phase().await, WorkflowPhase::Processing);
            assert_eq!(engine.uploaded_file().await, file_before);
            gate.open();
            outcome
        });

        assert!(matches!(first.unwrap(), SubmitOutcome::Completed(_)));
        assert_eq!(second.unwrap(), SubmitOutcome::AlreadyProcessing);
        assert_eq!(api.process_calls(), 1);
    }

    #[tokio::test]
    async fn test_reply_for_replaced_file_is_discarded() {
        let gate = Gate::new();
        let api = MockApi::new()
            .with_process_gate(gate.clone())
            .with_process_reply(Ok(HttpReply::json(
                200,
                &json!({"success": true, "data": {"rows": [{"a": 1}]}}),
            )));
        let (engine, _api, _presenter) = harness(api);
        engine.select_file(candidate("old.xlsx", 10)).await.unwrap();

        let (first, _) = tokio::join!(engine.submit(), async {
            while engine.phase().await != WorkflowPhase::Processing {
                tokio::task::yield_now().await;
            }
            engine.select_file(candidate("new.xlsx", 10)).await.unwrap();
            gate.open();
        });

        assert_eq!(first.unwrap(), SubmitOutcome::Superseded);
        assert_eq!(engine.phase().await, WorkflowPhase::Ready);
        assert!(engine.processed_result().await.is_none());
        assert_eq!(engine.uploaded_file().await.unwrap().name(), "new.xlsx");
    }

    #[tokio::test]
    async fn test_submit_after_reselect_waits_for_outstanding_request() {
        let gate = Gate::new();
        let api = MockApi::new()
            .with_process_gate(gate.clone())
            .with_process_reply(Ok(HttpReply::json(
                200,
                &json!({"success": true, "data": {"rows": [{"a": "old"}]}}),
            )))
            .with_process_reply(Ok(HttpReply::json(
                200,
                &json!({"success": true, "data": {"rows": [{"a": "new"}]}}),
            )));
        let (engine, api, _presenter) = harness(api);
        engine.select_file(candidate("old.xlsx", 10)).await.unwrap();

        let (first, second) = tokio::join!(engine.submit(), async {
            while engine.phase().await != WorkflowPhase::Processing {
                tokio::task::yield_now().await;
            }
            engine.select_file(candidate("new.xlsx", 10)).await.unwrap();
            let outcome = engine.submit().await;
            assert_eq!(api.process_calls(), 1);
            assert_eq!(engine.phase().await, WorkflowPhase::Ready);
            gate.open();
            outcome
        });

        assert_eq!(first.unwrap(), SubmitOutcome::Superseded);
        assert_eq!(second.unwrap(), SubmitOutcome::AlreadyProcessing);
        assert_eq!(api.process_calls(), 1);

        // the earlier reply is in, so the new file can go out now
        gate.open();
        match engine.submit().await.unwrap() {
            SubmitOutcome::Completed(result) => assert_eq!(result.rows[0]["a"], "new"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(api.process_calls(), 2);
        assert_eq!(engine.uploaded_file().await.unwrap().name(), "new.xlsx");
    }

    #[tokio::test]
    async fn test_resubmit_after_failure() {
        let api = MockApi::new()
            .with_process_reply(Ok(HttpReply::new(503, "")))
            .with_process_reply(Ok(HttpReply::json(
                200,
                &json!({"success": true, "data": {"rows": [{"a": 1}]}}),
            )));
        let (engine, api, _presenter) = harness(api);
        engine.select_file(candidate("plan.xlsx", 10)).await.unwrap();

        assert!(matches!(engine.submit().await.unwrap(), SubmitOutcome::Failed(_)));
        assert!(matches!(engine.submit().await.unwrap(), SubmitOutcome::Completed(_)));
        assert_eq!(api.process_calls(), 2);
    }

    #[test]
    fn test_failure_into_error() {
        assert!(matches!(
            ProcessFailure::transport(502).into_error(),
            CutFrameError::TransportError { status: 502 }
        ));
        assert!(matches!(
            ProcessFailure::application("nope").into_error(),
            CutFrameError::ApplicationError { .. }
        ));
    }
}
