//! Non-blocking agent operations
//!
//! [`EnvironmentSession::request`] validates the request on the console
//! thread, journals it, starts a [`BackgroundOperation`] and hands a watch to
//! the scheduler. It returns before the agent has been contacted. The outcome
//! is journaled by the watch on the first tick after the call finishes.

use std::fmt;
use tracing::{info, warn};

use crate::error::{ConsoleError, OperationError};
use crate::identity::Capability;
use crate::lock::LockManager;
use crate::model::{EntityKind, Environment};
use crate::observability::OperationTimer;
use crate::remote::{AgentEndpoint, AgentOperation, AgentRequest, BackgroundOperation, OperationId};
use crate::scheduler::{ContinuationId, OperationWatch};
use crate::session::{EnvironmentSession, SessionState};
use crate::telemetry::create_session_span;

/// What a remote operation acts on, relative to its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteTarget {
    Environment,
    ApplicationServer {
        server: String,
    },
    Application {
        server: String,
        application: String,
    },
    ConnectionPool {
        server: String,
        pool: String,
    },
    JmsServer {
        server: String,
        jms_server: String,
    },
    LogFile {
        log_file: String,
    },
}

impl RemoteTarget {
    pub fn kind(&self) -> EntityKind {
        match self {
            RemoteTarget::Environment => EntityKind::Environment,
            RemoteTarget::ApplicationServer { .. } => EntityKind::ApplicationServer,
            RemoteTarget::Application { .. } => EntityKind::Application,
            RemoteTarget::ConnectionPool { .. } => EntityKind::ConnectionPool,
            RemoteTarget::JmsServer { .. } => EntityKind::JmsServer,
            RemoteTarget::LogFile { .. } => EntityKind::LogFile,
        }
    }

    /// Checks that the target exists in `environment`.
    pub fn resolve(&self, environment: &Environment) -> Result<(), ConsoleError> {
        match self {
            RemoteTarget::Environment => {}
            RemoteTarget::ApplicationServer { server } => {
                environment.application_server(server)?;
            }
            RemoteTarget::Application {
                server,
                application,
            } => {
                environment
                    .application_server(server)?
                    .application(application)?;
            }
            RemoteTarget::ConnectionPool { server, pool } => {
                environment.application_server(server)?.connection_pool(pool)?;
            }
            RemoteTarget::JmsServer { server, jms_server } => {
                environment.application_server(server)?.jms_server(jms_server)?;
            }
            RemoteTarget::LogFile { log_file } => {
                crate::model::collection::get(&environment.log_files, log_file)?;
            }
        }
        Ok(())
    }

    /// Arguments passed to the agent: the environment name, then the path
    /// down to the target. Log files are addressed by their file path.
    pub fn args(&self, environment: &Environment) -> Vec<String> {
        let mut args = vec![environment.name.clone()];
        match self {
            RemoteTarget::Environment => {}
            RemoteTarget::ApplicationServer { server } => args.push(server.clone()),
            RemoteTarget::Application {
                server,
                application,
            } => args.extend([server.clone(), application.clone()]),
            RemoteTarget::ConnectionPool { server, pool } => {
                args.extend([server.clone(), pool.clone()])
            }
            RemoteTarget::JmsServer { server, jms_server } => {
                args.extend([server.clone(), jms_server.clone()])
            }
            RemoteTarget::LogFile { log_file } => {
                if let Some(file) = crate::model::collection::find(&environment.log_files, log_file) {
                    args.push(file.path.clone());
                    args.extend(file.application_server.clone());
                }
            }
        }
        args
    }

    /// Capability needed to provision this target.
    pub fn update_capability(&self) -> Option<Capability> {
        match self {
            RemoteTarget::Environment => Some(Capability::UpdateEnvironment),
            RemoteTarget::ApplicationServer { .. } => Some(Capability::UpdateApplicationServers),
            RemoteTarget::Application { .. } => Some(Capability::UpdateApplications),
            RemoteTarget::ConnectionPool { .. } | RemoteTarget::JmsServer { .. } => {
                Some(Capability::UpdateResources)
            }
            RemoteTarget::LogFile { .. } => None,
        }
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            RemoteTarget::Environment => f.write_str("environment"),
            RemoteTarget::ApplicationServer { server } => write!(f, "{kind} {server}"),
            RemoteTarget::Application {
                server,
                application,
            } => write!(f, "{kind} {application} on {server}"),
            RemoteTarget::ConnectionPool { server, pool } => write!(f, "{kind} {pool} on {server}"),
            RemoteTarget::JmsServer { server, jms_server } => {
                write!(f, "{kind} {jms_server} on {server}")
            }
            RemoteTarget::LogFile { log_file } => write!(f, "{kind} {log_file}"),
        }
    }
}

/// Receipt for a started operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTicket {
    pub continuation: ContinuationId,
    pub operation: OperationId,
    pub label: String,
}

impl EnvironmentSession {
    /// Starts `operation` on `target` and returns without waiting for it.
    ///
    /// Provisioning requires the update capability for the target, a clean
    /// environment and a lock that is free or held by this user. Read-only
    /// operations only need the target to exist.
    pub fn request(
        &mut self,
        environment: &str,
        operation: AgentOperation,
        target: RemoteTarget,
    ) -> Result<OperationTicket, ConsoleError> {
        let span = create_session_span(
            operation.as_str(),
            Some(environment),
            self.state.identity.user_id().as_str(),
        );
        let _enter = span.enter();

        let identity = &self.state.identity;
        let env = self.state.config.environment(environment)?;
        target.resolve(env)?;

        match (operation, &target) {
            (AgentOperation::ViewFile, RemoteTarget::LogFile { .. }) => {}
            (AgentOperation::ViewFile, _) => {
                return Err(ConsoleError::invalid(
                    target.kind(),
                    "only log files can be viewed",
                ))
            }
            (op, RemoteTarget::LogFile { .. }) if op.is_provisioning() => {
                return Err(ConsoleError::invalid(
                    EntityKind::LogFile,
                    "log files cannot be updated",
                ))
            }
            _ => {}
        }

        if operation.is_provisioning() {
            if let Some(capability) = target.update_capability() {
                identity.require(capability)?;
            }
            if env.updated {
                warn!(environment, "Refusing to provision an environment with unsaved changes");
                return Err(ConsoleError::UnsavedChanges {
                    environment: environment.to_string(),
                });
            }
            LockManager::check_mutation(env, identity)?;
        }

        let agent = match env.agent.as_deref() {
            Some(agent_id) => self
                .state
                .config
                .agent(agent_id)
                .map(AgentEndpoint::from)
                .ok_or_else(|| agent_id.to_string()),
            None => Err(String::new()),
        };
        let request = AgentRequest::new(operation, target.args(env));
        let label = format!("{} of {} ({environment})", operation.describe(), target);
        let requested = format!("{}: {label} requested", identity.user_id());

        let handle = match agent {
            Ok(endpoint) => BackgroundOperation::start(
                self.agents.clone(),
                endpoint,
                request,
                self.settings.call_timeout,
                label.clone(),
            ),
            Err(agent_id) => {
                let agent_id = if agent_id.is_empty() {
                    format!("(none assigned to {environment})")
                } else {
                    agent_id
                };
                BackgroundOperation::failed(label.clone(), OperationError::AgentNotFound { agent_id })
            }
        };

        self.state.journal_operation(environment, &requested);
        self.state.console.info(requested);
        self.state.metrics.record_started();

        let operation_id = handle.id();
        let timer = OperationTimer::new(&label);
        let env_name = environment.to_string();
        let watch_label = label.clone();
        let watch = OperationWatch::new(handle, move |state: &mut SessionState, result| {
            state.finish_operation(&env_name, &watch_label, result, timer)
        });
        let continuation = self.scheduler.submit(watch);

        info!(operation = %operation_id, continuation = %continuation, "Operation submitted");
        Ok(OperationTicket {
            continuation,
            operation: operation_id,
            label,
        })
    }

    pub fn update(
        &mut self,
        environment: &str,
        target: RemoteTarget,
    ) -> Result<OperationTicket, ConsoleError> {
        self.request(environment, AgentOperation::Update, target)
    }

    pub fn check_status(
        &mut self,
        environment: &str,
        target: RemoteTarget,
    ) -> Result<OperationTicket, ConsoleError> {
        self.request(environment, AgentOperation::Status, target)
    }

    /// Stops caring about an operation. It keeps running until its agent call
    /// ends, but its outcome is dropped. Returns false when the operation
    /// already reported.
    pub fn abandon(&mut self, ticket: &OperationTicket) -> bool {
        if !self.scheduler.abandon(ticket.continuation) {
            return false;
        }
        self.state.metrics.record_abandoned();
        self.state
            .console
            .warning(format!("{} abandoned, its outcome will not be reported", ticket.label));
        true
    }
}
