use serde::{Deserialize, Serialize};

use crate::journal::ChangeJournal;
use crate::lock::LockState;
use crate::model::collection::{self, Named};
use crate::model::{ApplicationServer, EntityKind};

/// A named, lockable deployment target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(default)]
    pub lock: LockState,
    /// Id of the agent performing remote operations for this environment.
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default, rename = "change_events")]
    pub journal: ChangeJournal,
    /// Unsaved edits are pending. Session state only, never persisted.
    #[serde(skip)]
    pub updated: bool,
    #[serde(default)]
    pub application_servers: Vec<ApplicationServer>,
    #[serde(default)]
    pub notifiers: Vec<Notifier>,
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    #[serde(default)]
    pub log_files: Vec<LogFile>,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lock: LockState::Unlocked,
            agent: None,
            journal: ChangeJournal::default(),
            updated: false,
            application_servers: Vec::new(),
            notifiers: Vec::new(),
            publishers: Vec::new(),
            log_files: Vec::new(),
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent = Some(agent_id.into());
        self
    }

    pub fn application_server(&self, name: &str) -> Result<&ApplicationServer, crate::ConsoleError> {
        collection::get(&self.application_servers, name)
    }

    pub fn application_server_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut ApplicationServer, crate::ConsoleError> {
        collection::get_mut(&mut self.application_servers, name)
    }
}

impl Named for Environment {
    const KIND: EntityKind = EntityKind::Environment;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Sends alerts to recipients once an update finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notifier {
    pub name: String,
    /// Minutes to wait before the notified update starts.
    #[serde(default)]
    pub countdown: u32,
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl Notifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            countdown: 0,
            recipients: Vec::new(),
        }
    }
}

impl Named for Notifier {
    const KIND: EntityKind = EntityKind::Notifier;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Publishes update reports (mail, XMPP, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub destinations: Vec<String>,
}

impl Publisher {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            destinations: Vec::new(),
        }
    }
}

impl Named for Publisher {
    const KIND: EntityKind = EntityKind::Publisher;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A file on the environment's hosts that operators may view remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFile {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub application_server: Option<String>,
}

impl LogFile {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            application_server: None,
        }
    }
}

impl Named for LogFile {
    const KIND: EntityKind = EntityKind::LogFile;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
