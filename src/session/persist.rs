// Explicit locking and persistence.
//
// Everything here goes through the store with a read-modify-write of the
// stored document, so a lock or save from another session that happened
// after this session loaded is seen and respected.

use tracing::{debug, info, warn};

use crate::error::ConsoleError;
use crate::identity::{Identity, UserId};
use crate::lock::LockManager;
use crate::model::{collection, Config, Environment};
use crate::session::EnvironmentSession;

impl EnvironmentSession {
    /// Takes the lock on `environment` and persists it right away.
    pub fn acquire_lock(&mut self, environment: &str) -> Result<(), ConsoleError> {
        self.persist_lock(environment, LockManager::acquire)
    }

    /// Gives up the lock. Administrators may release any lock.
    pub fn release_lock(&mut self, environment: &str) -> Result<(), ConsoleError> {
        self.persist_lock(environment, LockManager::release)
    }

    /// Administrator override: hand the lock over, or clear it with `None`.
    pub fn reassign_lock(
        &mut self,
        environment: &str,
        new_owner: Option<UserId>,
    ) -> Result<(), ConsoleError> {
        self.persist_lock(environment, |env, identity| {
            LockManager::reassign(env, identity, new_owner.clone())
        })
    }

    fn persist_lock<F>(&mut self, environment: &str, change: F) -> Result<(), ConsoleError>
    where
        F: Fn(&mut Environment, &Identity) -> Result<(), ConsoleError>,
    {
        let identity = &self.state.identity;
        self.state.config.environment(environment)?;

        let mut stored = self.store.load()?;
        let stored_lock = match stored.environment_mut(environment) {
            Ok(stored_env) => {
                change(stored_env, identity)?;
                Some(stored_env.lock.clone())
            }
            Err(ConsoleError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        let lock = match stored_lock {
            Some(lock) => {
                self.store.save(&stored)?;
                lock
            }
            // Not saved yet; the lock is persisted with the first save.
            None => {
                let mut draft = self.state.config.environment(environment)?.clone();
                change(&mut draft, identity)?;
                draft.lock
            }
        };

        let env = self.state.config.environment_mut(environment)?;
        debug!(environment, lock = ?lock.owner(), "Lock state updated");
        env.lock = lock;
        Ok(())
    }

    /// Writes `environment` back to the store and clears its dirty flag.
    ///
    /// Edits are only written over a stored copy this session has seen: the
    /// save fails with `Locked` when another user holds the stored lock, and
    /// with `Stale` when another session saved the environment after this one
    /// loaded it. An environment without edits only carries journal entries
    /// of remote operations; those are appended to whatever is stored.
    pub fn save_environment(&mut self, environment: &str, release: bool) -> Result<(), ConsoleError> {
        let identity = &self.state.identity;
        let current = self.state.config.environment(environment)?;

        let mut stored = self.store.load()?;
        let mut saved = match collection::find(&stored.environments, environment) {
            None => current.clone(),
            Some(stored_env) if !current.updated => {
                let mut rebased = stored_env.clone();
                for entry in self
                    .state
                    .unsaved_operations
                    .get(environment)
                    .into_iter()
                    .flatten()
                {
                    rebased.journal.append(entry.as_str());
                }
                rebased
            }
            Some(stored_env) => {
                LockManager::check_mutation(stored_env, identity)?;
                if !current.journal.extends(&stored_env.journal) {
                    warn!(
                        environment,
                        user = %identity.user_id(),
                        "Refusing to overwrite a newer stored copy"
                    );
                    return Err(ConsoleError::Stale {
                        environment: environment.to_string(),
                    });
                }
                current.clone()
            }
        };

        saved.updated = false;
        if release {
            LockManager::release(&mut saved, identity)?;
        }
        stored.upsert_environment(saved.clone());
        self.store.save(&stored)?;

        let released = !saved.lock.is_locked();
        self.state.config.upsert_environment(saved);
        self.state.unsaved_operations.remove(environment);
        info!(environment, released, "Environment saved");
        self.state.console.info(format!("Environment {environment} saved"));
        Ok(())
    }

    /// Throws away unsaved edits by going back to the stored copy. An
    /// environment that was never saved disappears. Journal entries of remote
    /// operations are kept.
    pub fn discard_environment(&mut self, environment: &str) -> Result<(), ConsoleError> {
        self.state.config.environment(environment)?;
        let stored = self.store.load()?;

        match collection::find(&stored.environments, environment) {
            Some(stored_env) => {
                self.state.config.upsert_environment(stored_env.clone());
                self.state.replay_operations(environment);
            }
            None => {
                collection::remove(&mut self.state.config.environments, environment)?;
                if let Some(lost) = self.state.unsaved_operations.remove(environment) {
                    self.state.console.warning(format!(
                        "{} journal entries of {environment} dropped with it",
                        lost.len()
                    ));
                }
            }
        }
        self.state
            .console
            .info(format!("Unsaved changes of {environment} discarded"));
        Ok(())
    }

    /// Replaces the whole tree with the stored one. Unsaved edits are lost,
    /// and the console lists the environments they belonged to. Unsaved
    /// journal entries of remote operations are appended to the fresh copies.
    pub fn reload(&mut self) -> Result<(), ConsoleError> {
        let fresh: Config = self.store.load()?;
        let dropped: Vec<String> = self
            .state
            .config
            .environments
            .iter()
            .filter(|env| env.updated)
            .map(|env| env.name.clone())
            .collect();

        self.state.config = fresh;

        let pending: Vec<String> = self.state.unsaved_operations.keys().cloned().collect();
        let mut kept = Vec::new();
        for environment in pending {
            if self.state.config.environment(&environment).is_ok() {
                let count = self.state.replay_operations(&environment);
                kept.push(format!("{environment} ({count})"));
            } else if let Some(lost) = self.state.unsaved_operations.remove(&environment) {
                self.state.console.warning(format!(
                    "Environment {environment} no longer exists, {} journal entries dropped",
                    lost.len()
                ));
            }
        }

        if dropped.is_empty() {
            self.state.console.info("Configuration reloaded");
        } else {
            self.state.console.warning(format!(
                "Configuration reloaded, unsaved changes of {} dropped",
                dropped.join(", ")
            ));
        }
        if !kept.is_empty() {
            self.state.console.info(format!(
                "Unsaved operation journal entries kept for {}",
                kept.join(", ")
            ));
        }
        Ok(())
    }

    /// Persists the agent list. Environments in the store are left as stored.
    pub fn save_agents(&mut self) -> Result<(), ConsoleError> {
        self.state.identity.require_admin("manage agents")?;
        let mut stored = self.store.load()?;
        stored.agents = self.state.config.agents.clone();
        self.store.save(&stored)?;
        self.state.console.info("Agents saved");
        Ok(())
    }
}
