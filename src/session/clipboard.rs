// Copy and paste of configuration entities between environments and servers.
// Copying is a read and needs no permission; pasting is an ordinary edit.

use tracing::debug;

use crate::clipboard::ClipboardEntity;
use crate::error::ConsoleError;
use crate::identity::Capability;
use crate::model::{collection, EntityKind, Environment};
use crate::session::EnvironmentSession;

/// Locates an entity to copy within an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    ApplicationServer { server: String },
    Application { server: String, application: String },
    ConnectionPool { server: String, pool: String },
    JmsServer { server: String, jms_server: String },
    Notifier { notifier: String },
    Publisher { publisher: String },
    LogFile { log_file: String },
}

impl EntityRef {
    fn resolve(&self, env: &Environment) -> Result<ClipboardEntity, ConsoleError> {
        Ok(match self {
            EntityRef::ApplicationServer { server } => {
                ClipboardEntity::ApplicationServer(env.application_server(server)?.clone())
            }
            EntityRef::Application {
                server,
                application,
            } => ClipboardEntity::Application(
                env.application_server(server)?.application(application)?.clone(),
            ),
            EntityRef::ConnectionPool { server, pool } => ClipboardEntity::ConnectionPool(
                env.application_server(server)?.connection_pool(pool)?.clone(),
            ),
            EntityRef::JmsServer { server, jms_server } => ClipboardEntity::JmsServer(
                env.application_server(server)?.jms_server(jms_server)?.clone(),
            ),
            EntityRef::Notifier { notifier } => {
                ClipboardEntity::Notifier(collection::get(&env.notifiers, notifier)?.clone())
            }
            EntityRef::Publisher { publisher } => {
                ClipboardEntity::Publisher(collection::get(&env.publishers, publisher)?.clone())
            }
            EntityRef::LogFile { log_file } => {
                ClipboardEntity::LogFile(collection::get(&env.log_files, log_file)?.clone())
            }
        })
    }
}

/// Where a pasted entity goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteTarget {
    /// Application servers, notifiers, publishers and log files.
    Environment,
    /// Applications, connection pools and JMS servers.
    ApplicationServer { server: String },
}

impl PasteTarget {
    fn accepts(&self) -> &'static str {
        match self {
            PasteTarget::Environment => "application server, notifier, publisher or log file",
            PasteTarget::ApplicationServer { .. } => {
                "application, JDBC connection pool or JMS server"
            }
        }
    }
}

fn edit_capability(kind: EntityKind) -> Capability {
    match kind {
        EntityKind::ApplicationServer => Capability::EditApplicationServers,
        EntityKind::Application => Capability::EditApplications,
        EntityKind::ConnectionPool | EntityKind::JmsServer => Capability::EditResources,
        EntityKind::Notifier | EntityKind::Publisher => Capability::EditNotifiers,
        _ => Capability::EditEnvironment,
    }
}

impl EnvironmentSession {
    /// Puts a deep copy of the referenced entity on the clipboard.
    pub fn copy(&mut self, environment: &str, entity: &EntityRef) -> Result<EntityKind, ConsoleError> {
        let copied = entity.resolve(self.state.config.environment(environment)?)?;
        let kind = copied.kind();
        self.state
            .console
            .info(format!("Copied {kind} {} from {environment}", copied.name()));
        self.clipboard.copy(copied);
        Ok(kind)
    }

    /// Inserts a clone of the clipboard content, optionally under a new name.
    /// The clipboard keeps its content, so the same entity can be pasted again.
    pub fn paste(
        &mut self,
        environment: &str,
        target: &PasteTarget,
        rename: Option<&str>,
    ) -> Result<String, ConsoleError> {
        let mut entity = self.clipboard.paste_or_err()?;
        if let Some(name) = rename {
            entity = entity.renamed(name);
        }
        let kind = entity.kind();
        let name = entity.name().to_string();

        let fits = matches!(
            (target, &entity),
            (
                PasteTarget::Environment,
                ClipboardEntity::ApplicationServer(_)
                    | ClipboardEntity::Notifier(_)
                    | ClipboardEntity::Publisher(_)
                    | ClipboardEntity::LogFile(_)
            ) | (
                PasteTarget::ApplicationServer { .. },
                ClipboardEntity::Application(_)
                    | ClipboardEntity::ConnectionPool(_)
                    | ClipboardEntity::JmsServer(_)
            )
        );
        if !fits {
            return Err(ConsoleError::WrongClipboardKind {
                expected: target.accepts().to_string(),
                found: kind,
            });
        }

        debug!(environment, %kind, name = %name, "Pasting from clipboard");
        self.edit(environment, edit_capability(kind), |env| {
            match (target, entity) {
                (PasteTarget::Environment, ClipboardEntity::ApplicationServer(server)) => {
                    collection::insert(&mut env.application_servers, server)?
                }
                (PasteTarget::Environment, ClipboardEntity::Notifier(notifier)) => {
                    collection::insert(&mut env.notifiers, notifier)?
                }
                (PasteTarget::Environment, ClipboardEntity::Publisher(publisher)) => {
                    collection::insert(&mut env.publishers, publisher)?
                }
                (PasteTarget::Environment, ClipboardEntity::LogFile(log_file)) => {
                    collection::insert(&mut env.log_files, log_file)?
                }
                (PasteTarget::ApplicationServer { server }, ClipboardEntity::Application(app)) => {
                    collection::insert(&mut env.application_server_mut(server)?.applications, app)?
                }
                (PasteTarget::ApplicationServer { server }, ClipboardEntity::ConnectionPool(pool)) => {
                    collection::insert(
                        &mut env.application_server_mut(server)?.connection_pools,
                        pool,
                    )?
                }
                (PasteTarget::ApplicationServer { server }, ClipboardEntity::JmsServer(jms)) => {
                    collection::insert(&mut env.application_server_mut(server)?.jms_servers, jms)?
                }
                (_, other) => {
                    return Err(ConsoleError::WrongClipboardKind {
                        expected: target.accepts().to_string(),
                        found: other.kind(),
                    })
                }
            }
            Ok(match target {
                PasteTarget::Environment => format!("pasted {kind} {name}"),
                PasteTarget::ApplicationServer { server } => {
                    format!("pasted {kind} {name} into {server}")
                }
            })
        })?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::model::{Application, ApplicationServer, Config, ConnectionPool, Notifier};
    use crate::remote::MockAgentClient;
    use crate::session::SessionSettings;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn session() -> EnvironmentSession {
        let mut srv1 = ApplicationServer::new("srv1");
        srv1.applications.push(Application::new("shop", "mvn:shop"));
        srv1.connection_pools
            .push(ConnectionPool::new("ds1", "org.h2.Driver", "jdbc:h2:mem:"));
        let mut prod = Environment::new("prod");
        prod.application_servers.push(srv1);
        prod.application_servers.push(ApplicationServer::new("srv2"));
        prod.notifiers.push(Notifier::new("ops"));

        let mut config = Config::default();
        config.environments.push(prod);
        config.environments.push(Environment::new("qa"));
        EnvironmentSession::open(
            Identity::user("alice").with_capabilities(Capability::ALL.iter().copied()),
            Arc::new(InMemoryStore::new(config)),
            Arc::new(MockAgentClient::new()),
            SessionSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn pasted_server_is_a_deep_copy() {
        let mut session = session();
        session
            .copy(
                "prod",
                &EntityRef::ApplicationServer {
                    server: "srv1".to_string(),
                },
            )
            .unwrap();

        session.paste("qa", &PasteTarget::Environment, None).unwrap();

        let original = session
            .config()
            .environment("prod")
            .unwrap()
            .application_server("srv1")
            .unwrap()
            .clone();
        let pasted = session
            .config()
            .environment("qa")
            .unwrap()
            .application_server("srv1")
            .unwrap();
        assert_eq!(&original, pasted);
        assert!(!session.clipboard().is_empty());
    }

    #[test]
    fn repeated_paste_with_new_names() {
        let mut session = session();
        let target = PasteTarget::ApplicationServer {
            server: "srv2".to_string(),
        };
        session
            .copy(
                "prod",
                &EntityRef::ConnectionPool {
                    server: "srv1".to_string(),
                    pool: "ds1".to_string(),
                },
            )
            .unwrap();

        session.paste("prod", &target, None).unwrap();
        let err = session.paste("prod", &target, None).unwrap_err();
        assert!(matches!(err, ConsoleError::AlreadyExists { .. }));
        assert_eq!(session.paste("prod", &target, Some("ds2")).unwrap(), "ds2");

        let pools = &session
            .config()
            .environment("prod")
            .unwrap()
            .application_server("srv2")
            .unwrap()
            .connection_pools;
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].url, pools[1].url);
    }

    #[test]
    fn wrong_kind_and_empty_clipboard_are_rejected() {
        let mut session = session();
        assert!(matches!(
            session.paste("qa", &PasteTarget::Environment, None),
            Err(ConsoleError::EmptyClipboard)
        ));

        session
            .copy(
                "prod",
                &EntityRef::Application {
                    server: "srv1".to_string(),
                    application: "shop".to_string(),
                },
            )
            .unwrap();
        let err = session
            .paste("qa", &PasteTarget::Environment, None)
            .unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::WrongClipboardKind {
                found: EntityKind::Application,
                ..
            }
        ));
        assert!(session.config().environment("qa").unwrap().journal.is_empty());
    }

    #[test]
    fn copy_of_missing_entity_leaves_clipboard_alone() {
        let mut session = session();
        session
            .copy(
                "prod",
                &EntityRef::Notifier {
                    notifier: "ops".to_string(),
                },
            )
            .unwrap();
        assert!(session
            .copy(
                "prod",
                &EntityRef::Publisher {
                    publisher: "mail".to_string()
                }
            )
            .is_err());
        assert_eq!(session.clipboard().peek_kind(), Some(EntityKind::Notifier));
    }
}
