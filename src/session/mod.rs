//! Environment session
//!
//! [`EnvironmentSession`] is what one logged-in operator works through. It
//! owns the in-memory configuration tree, the cooperative scheduler that
//! watches background agent calls, and the session clipboard. All tree
//! mutations happen through `&mut self`, so there is exactly one writer; the
//! background tasks only ever write their own completion cell.
//!
//! The actions themselves live in submodules:
//! - [`edit`]: lock-checked, journaled mutations of the tree
//! - [`persist`]: explicit locking, save, discard and reload
//! - [`remote`]: non-blocking agent operations
//! - [`clipboard`]: copy and paste of configuration entities

pub mod clipboard;
pub mod console;
pub mod edit;
pub mod persist;
pub mod remote;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::clipboard::Clipboard;
use crate::config::StagehandConfig;
use crate::error::ConsoleError;
use crate::identity::Identity;
use crate::journal;
use crate::model::Config;
use crate::observability::{OperationTimer, SessionMetrics};
use crate::remote::{AgentClient, OperationResult};
use crate::scheduler::{TaskScheduler, TickReport};
use crate::store::ConfigStore;

pub use clipboard::{EntityRef, PasteTarget};
pub use console::{ConsoleLevel, ConsoleLog, ConsoleMessage};
pub use remote::{OperationTicket, RemoteTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Upper bound for one agent call.
    pub call_timeout: Duration,
    /// Interval used by [`EnvironmentSession::run_until_idle`].
    pub tick_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(300),
            tick_interval: Duration::from_secs(10),
        }
    }
}

impl From<&StagehandConfig> for SessionSettings {
    fn from(config: &StagehandConfig) -> Self {
        Self {
            call_timeout: config.agents.call_timeout(),
            tick_interval: config.scheduler.tick_interval(),
        }
    }
}

/// Everything the scheduler's continuations may touch.
pub struct SessionState {
    config: Config,
    identity: Identity,
    console: ConsoleLog,
    metrics: SessionMetrics,
    /// Journal entries of remote operations not saved yet, per environment.
    /// They survive discard and reload; edits do not.
    unsaved_operations: BTreeMap<String, Vec<String>>,
}

impl SessionState {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut ConsoleLog {
        &mut self.console
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Journals a remote operation event and remembers it until the
    /// environment is saved. Returns false when the environment is gone.
    fn journal_operation(&mut self, environment: &str, entry: &str) -> bool {
        match self.config.environment_mut(environment) {
            Ok(env) => {
                journal::append(env, entry);
                self.unsaved_operations
                    .entry(environment.to_string())
                    .or_default()
                    .push(entry.to_string());
                true
            }
            Err(_) => false,
        }
    }

    /// Appends the remembered operation entries of `environment` again, after
    /// its copy was replaced by the stored one. Returns how many there were.
    fn replay_operations(&mut self, environment: &str) -> usize {
        let Some(entries) = self.unsaved_operations.get(environment) else {
            return 0;
        };
        match self.config.environment_mut(environment) {
            Ok(env) => {
                for entry in entries {
                    journal::append(env, entry.as_str());
                }
                entries.len()
            }
            Err(_) => 0,
        }
    }

    /// Terminal action of a remote operation: one journal entry and one
    /// console message. The environment's dirty flag is left alone.
    fn finish_operation(
        &mut self,
        environment: &str,
        label: &str,
        result: &OperationResult,
        timer: OperationTimer,
    ) {
        let entry = match result {
            Ok(message) if message.is_empty() => format!("{label} succeeded"),
            Ok(message) => format!("{label} succeeded: {message}"),
            Err(e) => format!("{label} failed: {e}"),
        };

        if !self.journal_operation(environment, &entry) {
            self.console.warning(format!(
                "Environment {environment} disappeared before {label} reported"
            ));
        }

        match result {
            Ok(_) => {
                self.metrics.record_succeeded();
                self.console.info(entry);
            }
            Err(_) => {
                self.metrics.record_failed();
                self.console.error(entry);
            }
        }
        timer.finish(result.is_ok());
    }
}

pub struct EnvironmentSession {
    state: SessionState,
    scheduler: TaskScheduler<SessionState>,
    clipboard: Clipboard,
    store: Arc<dyn ConfigStore>,
    agents: Arc<dyn AgentClient>,
    settings: SessionSettings,
}

impl EnvironmentSession {
    /// Logs `identity` in and loads the configuration tree.
    pub fn open(
        identity: Identity,
        store: Arc<dyn ConfigStore>,
        agents: Arc<dyn AgentClient>,
        settings: SessionSettings,
    ) -> Result<Self, ConsoleError> {
        let config = store.load()?;
        info!(
            user = %identity.user_id(),
            admin = identity.is_admin(),
            environments = config.environments.len(),
            "Session opened"
        );
        Ok(Self {
            state: SessionState {
                config,
                identity,
                console: ConsoleLog::default(),
                metrics: SessionMetrics::new(),
                unsaved_operations: BTreeMap::new(),
            },
            scheduler: TaskScheduler::new(),
            clipboard: Clipboard::new(),
            store,
            agents,
            settings,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.state.identity
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn console(&self) -> &ConsoleLog {
        &self.state.console
    }

    pub fn console_mut(&mut self) -> &mut ConsoleLog {
        &mut self.state.console
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.state.metrics
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Operations whose outcome has not been reported yet, abandoned ones included.
    pub fn in_flight(&self) -> usize {
        self.scheduler.pending()
    }

    /// One scheduler pass over the pending operations.
    pub fn tick(&mut self) -> TickReport {
        let report = self.scheduler.tick(&mut self.state);
        self.state.metrics.record_tick(report.resumed);
        if report.resumed > 0 {
            debug!(
                resumed = report.resumed,
                finished = report.finished,
                pending = report.pending,
                "Scheduler tick"
            );
        }
        report
    }

    /// Ticks at the configured interval until nothing is in flight.
    pub async fn run_until_idle(&mut self) -> u64 {
        let mut ticker = tokio::time::interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut ticks = 0;
        while self.in_flight() > 0 {
            ticker.tick().await;
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Ends the session. The clipboard does not outlive it.
    pub fn logout(&mut self) {
        self.clipboard.clear();
        info!(
            user = %self.state.identity.user_id(),
            in_flight = self.in_flight(),
            "Session closed"
        );
    }
}
