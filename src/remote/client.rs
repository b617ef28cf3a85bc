//! Agent RPC abstraction
//!
//! The coordinator never speaks an agent's wire protocol. It hands an
//! [`AgentRequest`] to an [`AgentClient`] and gets back either the agent's
//! answer or an [`AgentCallError`]. The shipped [`CommandAgentClient`]
//! delegates each call to an external bridge program.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::error::OperationError;
use crate::model::Agent;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Remote capabilities exposed by agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentOperation {
    Version,
    Status,
    Check,
    Update,
    ViewFile,
}

impl AgentOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentOperation::Version => "version",
            AgentOperation::Status => "status",
            AgentOperation::Check => "check",
            AgentOperation::Update => "update",
            AgentOperation::ViewFile => "view-file",
        }
    }

    /// Human label used in journal entries.
    pub fn describe(&self) -> &'static str {
        match self {
            AgentOperation::Version => "Version query",
            AgentOperation::Status => "Status check",
            AgentOperation::Check => "Up-to-date check",
            AgentOperation::Update => "Update",
            AgentOperation::ViewFile => "File view",
        }
    }

    /// Provisioning operations change the remote side and are subject to
    /// the lock, dirty-flag and update-permission checks.
    pub fn is_provisioning(&self) -> bool {
        matches!(self, AgentOperation::Update)
    }
}

impl fmt::Display for AgentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "version" => Ok(AgentOperation::Version),
            "status" => Ok(AgentOperation::Status),
            "check" => Ok(AgentOperation::Check),
            "update" => Ok(AgentOperation::Update),
            "view-file" => Ok(AgentOperation::ViewFile),
            other => Err(format!(
                "unknown operation '{other}', expected version, status, check, update or view-file"
            )),
        }
    }
}

/// Where an agent listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpoint {
    pub agent_id: String,
    pub hostname: String,
    pub port: u16,
}

impl From<&Agent> for AgentEndpoint {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.id.clone(),
            hostname: agent.hostname.clone(),
            port: agent.port,
        }
    }
}

impl fmt::Display for AgentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.agent_id, self.hostname, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    pub operation: AgentOperation,
    pub args: Vec<String>,
}

impl AgentRequest {
    pub fn new(operation: AgentOperation, args: Vec<String>) -> Self {
        Self { operation, args }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgentCallError {
    /// The agent could not be reached or the transport broke down.
    #[error("{0}")]
    Transport(String),
    /// The agent answered with an application-level failure.
    #[error("{0}")]
    Remote(String),
}

impl From<AgentCallError> for OperationError {
    fn from(err: AgentCallError) -> Self {
        match err {
            AgentCallError::Transport(message) => OperationError::RpcFailure { message },
            AgentCallError::Remote(message) => OperationError::RemoteError { message },
        }
    }
}

/// Opaque RPC stub for agent operations. Implementations may block for as
/// long as the remote side needs; callers apply their own timeout.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn call(
        &self,
        endpoint: &AgentEndpoint,
        request: &AgentRequest,
    ) -> Result<String, AgentCallError>;
}

/// Runs `<bridge> <hostname> <port> <operation> <args...>` per call.
///
/// Exit status 0 means success and stdout is the agent's answer. Any other
/// status is an agent-reported failure described by stderr. Failing to run
/// the bridge at all is a transport failure.
#[derive(Debug, Clone)]
pub struct CommandAgentClient {
    program: String,
}

impl CommandAgentClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl AgentClient for CommandAgentClient {
    async fn call(
        &self,
        endpoint: &AgentEndpoint,
        request: &AgentRequest,
    ) -> Result<String, AgentCallError> {
        debug!(
            bridge = %self.program,
            agent = %endpoint,
            operation = %request.operation,
            args = ?request.args,
            "Invoking agent bridge"
        );

        let output = Command::new(&self.program)
            .arg(&endpoint.hostname)
            .arg(endpoint.port.to_string())
            .arg(request.operation.as_str())
            .args(&request.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AgentCallError::Transport(format!("agent bridge '{}' not found", self.program))
                } else {
                    AgentCallError::Transport(format!("agent bridge '{}': {e}", self.program))
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = match (stderr.is_empty(), output.status.code()) {
            (false, _) => stderr,
            (true, Some(code)) => format!("agent bridge exited with status {code}"),
            (true, None) => "agent bridge was terminated by a signal".to_string(),
        };
        Err(AgentCallError::Remote(message))
    }
}
