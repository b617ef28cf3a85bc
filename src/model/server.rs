use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;
use crate::model::collection::{self, Named};
use crate::model::EntityKind;

/// A J2EE application server with its deployed applications and resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationServer {
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub jmx_url: String,
    #[serde(default)]
    pub admin_user: String,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub connection_pools: Vec<ConnectionPool>,
    #[serde(default)]
    pub jms_servers: Vec<JmsServer>,
}

impl ApplicationServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            jmx_url: String::new(),
            admin_user: String::new(),
            applications: Vec::new(),
            connection_pools: Vec::new(),
            jms_servers: Vec::new(),
        }
    }

    pub fn application(&self, name: &str) -> Result<&Application, ConsoleError> {
        collection::get(&self.applications, name)
    }

    pub fn application_mut(&mut self, name: &str) -> Result<&mut Application, ConsoleError> {
        collection::get_mut(&mut self.applications, name)
    }

    pub fn connection_pool(&self, name: &str) -> Result<&ConnectionPool, ConsoleError> {
        collection::get(&self.connection_pools, name)
    }

    pub fn jms_server(&self, name: &str) -> Result<&JmsServer, ConsoleError> {
        collection::get(&self.jms_servers, name)
    }

    pub fn jms_server_mut(&mut self, name: &str) -> Result<&mut JmsServer, ConsoleError> {
        collection::get_mut(&mut self.jms_servers, name)
    }
}

impl Named for ApplicationServer {
    const KIND: EntityKind = EntityKind::ApplicationServer;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub active: bool,
    /// A failed update of a blocker application aborts the whole server update.
    #[serde(default)]
    pub blocker: bool,
}

impl Application {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            active: true,
            blocker: false,
        }
    }
}

impl Named for Application {
    const KIND: EntityKind = EntityKind::Application;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// JDBC connection pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPool {
    pub name: String,
    pub driver: String,
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub initial: u32,
    #[serde(default)]
    pub maximal: u32,
    #[serde(default)]
    pub increment: u32,
    #[serde(default)]
    pub active: bool,
}

impl ConnectionPool {
    pub fn new(name: impl Into<String>, driver: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            url: url.into(),
            user: String::new(),
            initial: 1,
            maximal: 10,
            increment: 1,
            active: true,
        }
    }
}

impl Named for ConnectionPool {
    const KIND: EntityKind = EntityKind::ConnectionPool;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JmsServer {
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub queues: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl JmsServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            queues: Vec::new(),
            topics: Vec::new(),
        }
    }
}

impl Named for JmsServer {
    const KIND: EntityKind = EntityKind::JmsServer;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
