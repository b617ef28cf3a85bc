// Journaled edits of the configuration tree.
//
// Every edit runs the same gate: capability, then lock, then the change on a
// draft copy of the environment. Only a draft that changed successfully is
// committed, together with the implicit lock claim, one journal entry and the
// dirty flag. A failing edit leaves the tree exactly as it was.

use tracing::{info, warn};

use crate::error::ConsoleError;
use crate::identity::Capability;
use crate::journal;
use crate::lock::LockManager;
use crate::model::collection;
use crate::model::{
    Agent, Application, ApplicationServer, ConnectionPool, EntityKind, Environment, JmsServer,
    LogFile, Notifier, Publisher,
};
use crate::session::EnvironmentSession;
use crate::telemetry::create_session_span;

impl EnvironmentSession {
    /// Applies `change` to `environment` under the lock and permission rules.
    /// `change` returns the journal text describing what it did.
    pub fn edit<F>(
        &mut self,
        environment: &str,
        capability: Capability,
        change: F,
    ) -> Result<(), ConsoleError>
    where
        F: FnOnce(&mut Environment) -> Result<String, ConsoleError>,
    {
        let span = create_session_span(
            "edit",
            Some(environment),
            self.state.identity.user_id().as_str(),
        );
        let _enter = span.enter();

        let identity = &self.state.identity;
        if let Err(e) = identity.require(capability) {
            warn!(error = %e, "Edit refused");
            return Err(e);
        }
        let current = self.state.config.environment(environment)?;
        LockManager::check_mutation(current, identity)?;

        let mut draft = current.clone();
        let description = change(&mut draft)?;
        let entry = format!("{}: {}", identity.user_id(), description);

        LockManager::claim(&mut draft, identity);
        journal::append(&mut draft, entry.clone());
        draft.updated = true;

        *self.state.config.environment_mut(environment)? = draft;
        self.state.console.info(entry);
        Ok(())
    }

    // Environments

    pub fn create_environment(
        &mut self,
        name: &str,
        agent: Option<&str>,
    ) -> Result<(), ConsoleError> {
        self.state.identity.require_admin("create environments")?;
        if let Some(agent_id) = agent {
            self.require_agent(agent_id)?;
        }

        let mut environment = Environment::new(name);
        environment.agent = agent.map(str::to_string);
        collection::insert(&mut self.state.config.environments, environment)?;

        let entry = format!("{}: created environment {name}", self.state.identity.user_id());
        let env = self.state.config.environment_mut(name)?;
        LockManager::claim(env, &self.state.identity);
        journal::append(env, entry.clone());
        env.updated = true;
        self.state.console.info(entry);
        Ok(())
    }

    /// Removes the environment from the store right away. Administrators
    /// may delete environments locked by someone else.
    pub fn delete_environment(&mut self, name: &str) -> Result<(), ConsoleError> {
        self.state.identity.require_admin("delete environments")?;
        self.state.config.environment(name)?;

        let mut stored = self.store.load()?;
        if collection::contains(&stored.environments, name) {
            collection::remove(&mut stored.environments, name)?;
            self.store.save(&stored)?;
        }
        let removed = collection::remove(&mut self.state.config.environments, name)?;
        self.state.unsaved_operations.remove(name);

        if let Some(owner) = removed.lock.owner() {
            info!(environment = name, owner = %owner, "Deleted a locked environment");
        }
        self.state.console.info(format!(
            "{}: deleted environment {name}",
            self.state.identity.user_id()
        ));
        Ok(())
    }

    pub fn set_environment_agent(
        &mut self,
        environment: &str,
        agent: Option<&str>,
    ) -> Result<(), ConsoleError> {
        if let Some(agent_id) = agent {
            self.require_agent(agent_id)?;
        }
        self.edit(environment, Capability::EditEnvironment, |env| {
            env.agent = agent.map(str::to_string);
            Ok(match agent {
                Some(agent_id) => format!("assigned agent {agent_id} to {}", env.name),
                None => format!("removed the agent of {}", env.name),
            })
        })
    }

    fn require_agent(&self, agent_id: &str) -> Result<(), ConsoleError> {
        self.state
            .config
            .agent(agent_id)
            .map(|_| ())
            .ok_or_else(|| ConsoleError::not_found(EntityKind::Agent, agent_id))
    }

    // Application servers

    pub fn add_application_server(
        &mut self,
        environment: &str,
        server: ApplicationServer,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditApplicationServers, |env| {
            let name = server.name.clone();
            collection::insert(&mut env.application_servers, server)?;
            Ok(format!("added {} {name}", EntityKind::ApplicationServer))
        })
    }

    pub fn remove_application_server(
        &mut self,
        environment: &str,
        server: &str,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditApplicationServers, |env| {
            collection::remove(&mut env.application_servers, server)?;
            // Log files stay, detached from the server.
            for log_file in env
                .log_files
                .iter_mut()
                .filter(|f| f.application_server.as_deref() == Some(server))
            {
                log_file.application_server = None;
            }
            Ok(format!("removed {} {server}", EntityKind::ApplicationServer))
        })
    }

    pub fn rename_application_server(
        &mut self,
        environment: &str,
        from: &str,
        to: &str,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditApplicationServers, |env| {
            collection::rename(&mut env.application_servers, from, to)?;
            for log_file in env
                .log_files
                .iter_mut()
                .filter(|f| f.application_server.as_deref() == Some(from))
            {
                log_file.application_server = Some(to.to_string());
            }
            Ok(format!("renamed {} {from} to {to}", EntityKind::ApplicationServer))
        })
    }

    // Applications

    pub fn add_application(
        &mut self,
        environment: &str,
        server: &str,
        application: Application,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditApplications, |env| {
            let name = application.name.clone();
            collection::insert(&mut env.application_server_mut(server)?.applications, application)?;
            Ok(format!("added {} {name} to {server}", EntityKind::Application))
        })
    }

    pub fn remove_application(
        &mut self,
        environment: &str,
        server: &str,
        application: &str,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditApplications, |env| {
            collection::remove(&mut env.application_server_mut(server)?.applications, application)?;
            Ok(format!("removed {} {application} from {server}", EntityKind::Application))
        })
    }

    pub fn set_application_active(
        &mut self,
        environment: &str,
        server: &str,
        application: &str,
        active: bool,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditApplications, |env| {
            let app = env.application_server_mut(server)?.application_mut(application)?;
            app.active = active;
            Ok(format!(
                "{} {} {application} on {server}",
                if active { "activated" } else { "deactivated" },
                EntityKind::Application
            ))
        })
    }

    /// Flips the active flag and returns the new value.
    pub fn toggle_application_active(
        &mut self,
        environment: &str,
        server: &str,
        application: &str,
    ) -> Result<bool, ConsoleError> {
        let active = self
            .state
            .config
            .environment(environment)?
            .application_server(server)?
            .application(application)?
            .active;
        self.set_application_active(environment, server, application, !active)?;
        Ok(!active)
    }

    // Resources

    pub fn add_connection_pool(
        &mut self,
        environment: &str,
        server: &str,
        pool: ConnectionPool,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditResources, |env| {
            let name = pool.name.clone();
            collection::insert(&mut env.application_server_mut(server)?.connection_pools, pool)?;
            Ok(format!("added {} {name} to {server}", EntityKind::ConnectionPool))
        })
    }

    pub fn remove_connection_pool(
        &mut self,
        environment: &str,
        server: &str,
        pool: &str,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditResources, |env| {
            collection::remove(&mut env.application_server_mut(server)?.connection_pools, pool)?;
            Ok(format!("removed {} {pool} from {server}", EntityKind::ConnectionPool))
        })
    }

    pub fn add_jms_server(
        &mut self,
        environment: &str,
        server: &str,
        jms_server: JmsServer,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditResources, |env| {
            let name = jms_server.name.clone();
            collection::insert(&mut env.application_server_mut(server)?.jms_servers, jms_server)?;
            Ok(format!("added {} {name} to {server}", EntityKind::JmsServer))
        })
    }

    pub fn remove_jms_server(
        &mut self,
        environment: &str,
        server: &str,
        jms_server: &str,
    ) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditResources, |env| {
            collection::remove(&mut env.application_server_mut(server)?.jms_servers, jms_server)?;
            Ok(format!("removed {} {jms_server} from {server}", EntityKind::JmsServer))
        })
    }

    pub fn toggle_jms_server_active(
        &mut self,
        environment: &str,
        server: &str,
        jms_server: &str,
    ) -> Result<bool, ConsoleError> {
        let mut active = false;
        self.edit(environment, Capability::EditResources, |env| {
            let jms = env.application_server_mut(server)?.jms_server_mut(jms_server)?;
            jms.active = !jms.active;
            active = jms.active;
            Ok(format!(
                "{} {} {jms_server} on {server}",
                if jms.active { "activated" } else { "deactivated" },
                EntityKind::JmsServer
            ))
        })?;
        Ok(active)
    }

    // Environment-level entities

    pub fn add_notifier(&mut self, environment: &str, notifier: Notifier) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditNotifiers, |env| {
            let name = notifier.name.clone();
            collection::insert(&mut env.notifiers, notifier)?;
            Ok(format!("added {} {name}", EntityKind::Notifier))
        })
    }

    pub fn remove_notifier(&mut self, environment: &str, notifier: &str) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditNotifiers, |env| {
            collection::remove(&mut env.notifiers, notifier)?;
            Ok(format!("removed {} {notifier}", EntityKind::Notifier))
        })
    }

    pub fn add_publisher(&mut self, environment: &str, publisher: Publisher) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditNotifiers, |env| {
            let name = publisher.name.clone();
            collection::insert(&mut env.publishers, publisher)?;
            Ok(format!("added {} {name}", EntityKind::Publisher))
        })
    }

    pub fn remove_publisher(&mut self, environment: &str, publisher: &str) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditNotifiers, |env| {
            collection::remove(&mut env.publishers, publisher)?;
            Ok(format!("removed {} {publisher}", EntityKind::Publisher))
        })
    }

    pub fn add_log_file(&mut self, environment: &str, log_file: LogFile) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditEnvironment, |env| {
            if let Some(server) = log_file.application_server.as_deref() {
                env.application_server(server)?;
            }
            let name = log_file.name.clone();
            collection::insert(&mut env.log_files, log_file)?;
            Ok(format!("added {} {name}", EntityKind::LogFile))
        })
    }

    pub fn remove_log_file(&mut self, environment: &str, log_file: &str) -> Result<(), ConsoleError> {
        self.edit(environment, Capability::EditEnvironment, |env| {
            collection::remove(&mut env.log_files, log_file)?;
            Ok(format!("removed {} {log_file}", EntityKind::LogFile))
        })
    }

    // Agents

    /// Agents are not journaled; they are persisted with [`save_agents`](Self::save_agents).
    pub fn add_agent(&mut self, agent: Agent) -> Result<(), ConsoleError> {
        self.state.identity.require_admin("manage agents")?;
        agent.validate()?;
        let id = agent.id.clone();
        collection::insert(&mut self.state.config.agents, agent)?;
        self.state.console.info(format!("Agent {id} added"));
        Ok(())
    }

    pub fn update_agent(&mut self, agent: Agent) -> Result<(), ConsoleError> {
        self.state.identity.require_admin("manage agents")?;
        agent.validate()?;
        let existing = collection::get_mut(&mut self.state.config.agents, &agent.id)?;
        let id = agent.id.clone();
        *existing = agent;
        self.state.console.info(format!("Agent {id} updated"));
        Ok(())
    }

    /// Environments keep their reference; operations on them report the
    /// agent as missing until another one is assigned.
    pub fn remove_agent(&mut self, agent_id: &str) -> Result<(), ConsoleError> {
        self.state.identity.require_admin("manage agents")?;
        collection::remove(&mut self.state.config.agents, agent_id)?;
        let orphans: Vec<&str> = self
            .state
            .config
            .environments
            .iter()
            .filter(|env| env.agent.as_deref() == Some(agent_id))
            .map(|env| env.name.as_str())
            .collect();
        if !orphans.is_empty() {
            let text = format!(
                "Agent {agent_id} removed, still referenced by {}",
                orphans.join(", ")
            );
            self.state.console.warning(text);
        } else {
            self.state.console.info(format!("Agent {agent_id} removed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ConsoleError;
    use crate::identity::{Capability, Identity, UserId};
    use crate::lock::LockState;
    use crate::model::{
        Agent, Application, ApplicationServer, Config, ConnectionPool, Environment, JmsServer,
        LogFile,
    };
    use crate::remote::MockAgentClient;
    use crate::session::{EnvironmentSession, SessionSettings};
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn fixture() -> Config {
        let mut server = ApplicationServer::new("srv1");
        server.applications.push(Application::new("shop", "mvn:shop"));
        server
            .connection_pools
            .push(ConnectionPool::new("ds1", "org.h2.Driver", "jdbc:h2:mem:"));
        server.jms_servers.push(JmsServer::new("orders-q"));
        let mut prod = Environment::new("prod").with_agent("agent-1");
        prod.application_servers.push(server);

        let mut config = Config::default();
        config.environments.push(prod);
        config.agents.push(Agent::new("agent-1", "prod-host", 4000));
        config
    }

    fn session_for(identity: Identity, store: InMemoryStore) -> EnvironmentSession {
        EnvironmentSession::open(
            identity,
            Arc::new(store),
            Arc::new(MockAgentClient::new()),
            SessionSettings::default(),
        )
        .unwrap()
    }

    fn editor(user: &str) -> Identity {
        Identity::user(user).with_capabilities(Capability::ALL.iter().copied())
    }

    #[test]
    fn successful_edit_claims_journals_and_marks_dirty() {
        let mut session = session_for(editor("alice"), InMemoryStore::new(fixture()));

        session
            .add_application("prod", "srv1", Application::new("billing", "mvn:billing"))
            .unwrap();

        let env = session.config().environment("prod").unwrap();
        assert!(env.updated);
        assert!(env.lock.is_held_by(&UserId::from("alice")));
        assert_eq!(env.journal.len(), 1);
        assert_eq!(
            env.journal.last(),
            Some("alice: added J2EE application billing to srv1")
        );
    }

    #[test]
    fn duplicate_pool_is_rejected_without_side_effects() {
        let mut session = session_for(editor("alice"), InMemoryStore::new(fixture()));

        let err = session
            .add_connection_pool(
                "prod",
                "srv1",
                ConnectionPool::new("ds1", "org.h2.Driver", "jdbc:h2:mem:other"),
            )
            .unwrap_err();

        assert!(matches!(err, ConsoleError::AlreadyExists { .. }));
        let env = session.config().environment("prod").unwrap();
        assert_eq!(env.application_server("srv1").unwrap().connection_pools.len(), 1);
        assert!(env.journal.is_empty());
        assert!(!env.updated);
        assert_eq!(env.lock, LockState::Unlocked);
    }

    #[test]
    fn missing_capability_is_permission_denied() {
        let identity = Identity::user("bob").with_capability(Capability::EditApplications);
        let mut session = session_for(identity, InMemoryStore::new(fixture()));

        let err = session
            .remove_connection_pool("prod", "srv1", "ds1")
            .unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::PermissionDenied {
                capability: Capability::EditResources,
                ..
            }
        ));
    }

    #[test]
    fn admins_honour_the_lock_for_ordinary_edits() {
        let mut config = fixture();
        config.environments[0].lock = LockState::LockedBy(UserId::from("alice"));
        let mut session = session_for(Identity::admin("root"), InMemoryStore::new(config));

        let err = session
            .toggle_application_active("prod", "srv1", "shop")
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Locked { .. }));
    }

    #[test]
    fn toggles_report_the_new_state() {
        let mut session = session_for(editor("alice"), InMemoryStore::new(fixture()));

        assert!(!session.toggle_application_active("prod", "srv1", "shop").unwrap());
        assert!(!session.toggle_jms_server_active("prod", "srv1", "orders-q").unwrap());
        assert!(session.toggle_jms_server_active("prod", "srv1", "orders-q").unwrap());
        assert_eq!(session.config().environment("prod").unwrap().journal.len(), 3);
    }

    #[test]
    fn rename_server_follows_log_files() {
        let mut session = session_for(editor("alice"), InMemoryStore::new(fixture()));
        let mut log = LogFile::new("server-log", "/var/log/srv1.log");
        log.application_server = Some("srv1".to_string());
        session.add_log_file("prod", log).unwrap();

        session.rename_application_server("prod", "srv1", "srv-a").unwrap();

        let env = session.config().environment("prod").unwrap();
        assert!(env.application_server("srv-a").is_ok());
        assert_eq!(env.log_files[0].application_server.as_deref(), Some("srv-a"));
    }

    #[test]
    fn removed_server_detaches_its_log_files() {
        let mut session = session_for(editor("alice"), InMemoryStore::new(fixture()));
        let mut log = LogFile::new("server-log", "/var/log/srv1.log");
        log.application_server = Some("srv1".to_string());
        session.add_log_file("prod", log).unwrap();
        session
            .add_log_file("prod", LogFile::new("access-log", "/var/log/access.log"))
            .unwrap();

        session.remove_application_server("prod", "srv1").unwrap();

        let env = session.config().environment("prod").unwrap();
        assert!(env.application_server("srv1").is_err());
        assert_eq!(env.log_files.len(), 2);
        assert!(env.log_files.iter().all(|f| f.application_server.is_none()));
    }

    #[test]
    fn environment_administration_requires_admin() {
        let mut session = session_for(editor("alice"), InMemoryStore::new(fixture()));
        assert!(matches!(
            session.create_environment("qa", None),
            Err(ConsoleError::AdminRequired { .. })
        ));

        let store = InMemoryStore::new(fixture());
        let mut admin = session_for(Identity::admin("root"), store.clone());
        admin.create_environment("qa", Some("agent-1")).unwrap();
        assert!(admin.config().environment("qa").unwrap().updated);
        assert!(matches!(
            admin.create_environment("qa", None),
            Err(ConsoleError::AlreadyExists { .. })
        ));
        assert!(matches!(
            admin.create_environment("dev", Some("ghost")),
            Err(ConsoleError::NotFound { .. })
        ));
    }

    #[test]
    fn admin_deletes_a_locked_environment_from_the_store() {
        let mut config = fixture();
        config.environments[0].lock = LockState::LockedBy(UserId::from("alice"));
        let store = InMemoryStore::new(config);
        let mut session = session_for(Identity::admin("root"), store.clone());

        session.delete_environment("prod").unwrap();

        assert!(session.config().environments.is_empty());
        assert!(store.snapshot().environments.is_empty());
    }

    #[test]
    fn agents_are_validated() {
        let mut session = session_for(Identity::admin("root"), InMemoryStore::new(fixture()));

        let mut broken = Agent::new("agent-2", "qa-host", 4000);
        broken.cron = "every hour".to_string();
        assert!(matches!(
            session.add_agent(broken),
            Err(ConsoleError::Invalid { .. })
        ));

        session.add_agent(Agent::new("agent-2", "qa-host", 4000)).unwrap();
        session
            .update_agent(Agent::new("agent-2", "qa-host-2", 4001))
            .unwrap();
        assert_eq!(session.config().agent("agent-2").unwrap().port, 4001);

        session.remove_agent("agent-1").unwrap();
        assert!(session.console().last().unwrap().text.contains("still referenced by prod"));
    }
}
