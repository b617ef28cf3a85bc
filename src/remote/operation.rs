//! Background operations
//!
//! A [`BackgroundOperation`] runs one agent call on its own tokio task. The
//! task owns the sending half of a one-shot channel and is the only writer of
//! the outcome; the console thread keeps the [`OperationHandle`] and only
//! ever reads. Sending consumes the sender, so the outcome is written at most
//! once, and a task that disappears without sending is reported as a failure,
//! so it is also written at least once.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::error::OperationError;
use crate::remote::client::{AgentClient, AgentEndpoint, AgentRequest};
use crate::telemetry::{create_operation_span, generate_correlation_id};

pub type OperationResult = Result<String, OperationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(Uuid);

impl OperationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    Running,
    Completed(OperationResult),
}

impl OperationState {
    pub fn is_completed(&self) -> bool {
        matches!(self, OperationState::Completed(_))
    }
}

/// Console-side view of a background operation.
#[derive(Debug)]
pub struct OperationHandle {
    id: OperationId,
    label: String,
    receiver: oneshot::Receiver<OperationResult>,
    state: OperationState,
}

impl OperationHandle {
    fn new(label: String, receiver: oneshot::Receiver<OperationResult>) -> Self {
        Self {
            id: OperationId::new(),
            label,
            receiver,
            state: OperationState::Running,
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Last observed state, without checking for news.
    pub fn state(&self) -> &OperationState {
        &self.state
    }

    /// Checks the completion cell without blocking. Once completed the
    /// state never changes again.
    pub fn poll(&mut self) -> &OperationState {
        if matches!(self.state, OperationState::Running) {
            match self.receiver.try_recv() {
                Ok(result) => self.state = OperationState::Completed(result),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Closed) => {
                    warn!(operation = %self.label, "Background operation ended without an outcome");
                    self.state = OperationState::Completed(Err(lost_outcome()));
                }
            }
        }
        &self.state
    }

    /// Waits for the outcome. For async callers that prefer awaiting over
    /// polling through the scheduler.
    pub async fn outcome(self) -> OperationResult {
        match self.state {
            OperationState::Completed(result) => result,
            OperationState::Running => self.receiver.await.unwrap_or_else(|_| Err(lost_outcome())),
        }
    }
}

fn lost_outcome() -> OperationError {
    OperationError::RpcFailure {
        message: "background operation ended without reporting an outcome".to_string(),
    }
}

pub struct BackgroundOperation;

impl BackgroundOperation {
    /// Spawns the agent call and returns immediately.
    ///
    /// Must be called from within a tokio runtime. The call is bounded by
    /// `timeout`; an expired timeout completes the operation with an
    /// `RpcFailure`.
    pub fn start(
        client: Arc<dyn AgentClient>,
        endpoint: AgentEndpoint,
        request: AgentRequest,
        timeout: Duration,
        label: impl Into<String>,
    ) -> OperationHandle {
        let label = label.into();
        let (sender, receiver) = oneshot::channel();
        let handle = OperationHandle::new(label.clone(), receiver);

        let correlation_id = generate_correlation_id();
        let span = create_operation_span(
            request.operation.as_str(),
            &endpoint.agent_id,
            &handle.id.to_string(),
            &correlation_id,
        );

        tokio::spawn(
            async move {
                info!(agent = %endpoint, operation = %label, "Agent call started");
                let result = match tokio::time::timeout(timeout, client.call(&endpoint, &request)).await
                {
                    Ok(Ok(answer)) => Ok(answer),
                    Ok(Err(e)) => Err(OperationError::from(e)),
                    Err(_) => Err(OperationError::RpcFailure {
                        message: format!(
                            "no answer from agent {} within {}s",
                            endpoint,
                            timeout.as_secs_f64()
                        ),
                    }),
                };
                match &result {
                    Ok(_) => info!(operation = %label, "Agent call succeeded"),
                    Err(e) => warn!(operation = %label, error = %e, "Agent call failed"),
                }
                if sender.send(result).is_err() {
                    debug!(operation = %label, "Operation handle dropped before completion");
                }
            }
            .instrument(span),
        );

        handle
    }

    /// An operation that failed before it could start, for example because
    /// its agent is not configured. It still flows through the scheduler so
    /// the failure is reported the same way as a remote one.
    pub fn failed(label: impl Into<String>, error: OperationError) -> OperationHandle {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(Err(error));
        OperationHandle::new(label.into(), receiver)
    }
}
