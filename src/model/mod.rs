// Configuration tree edited by the console: environments, their application
// servers and resources, and the agents that provision them.

pub mod agent;
pub mod collection;
pub mod environment;
pub mod server;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConsoleError;

pub use agent::Agent;
pub use collection::Named;
pub use environment::{Environment, LogFile, Notifier, Publisher};
pub use server::{Application, ApplicationServer, ConnectionPool, JmsServer};

/// Kinds of configuration entities, used for error reporting and clipboard
/// type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Environment,
    Agent,
    ApplicationServer,
    Application,
    ConnectionPool,
    JmsServer,
    Notifier,
    Publisher,
    LogFile,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Environment => "environment",
            EntityKind::Agent => "agent",
            EntityKind::ApplicationServer => "J2EE application server",
            EntityKind::Application => "J2EE application",
            EntityKind::ConnectionPool => "JDBC connection pool",
            EntityKind::JmsServer => "JMS server",
            EntityKind::Notifier => "notifier",
            EntityKind::Publisher => "publisher",
            EntityKind::LogFile => "log file",
        };
        f.write_str(label)
    }
}

/// Root of the configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub agents: Vec<Agent>,
}

impl Config {
    pub fn environment(&self, name: &str) -> Result<&Environment, ConsoleError> {
        collection::get(&self.environments, name)
    }

    pub fn environment_mut(&mut self, name: &str) -> Result<&mut Environment, ConsoleError> {
        collection::get_mut(&mut self.environments, name)
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        collection::find(&self.agents, id)
    }

    /// Replaces the environment with the same name, or appends it.
    pub fn upsert_environment(&mut self, environment: Environment) {
        match collection::find_mut(&mut self.environments, &environment.name) {
            Some(existing) => *existing = environment,
            None => self.environments.push(environment),
        }
    }
}
