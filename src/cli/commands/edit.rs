use anyhow::Result;
use stagehand::{
    Application, ApplicationServer, ConnectionPool, EntityRef, EnvironmentSession, JmsServer,
    PasteTarget,
};

use super::{persist, Command};
use crate::cli::{AppCommand, JmsCommand, PoolCommand, ServerCommand};

/// One of the application server level edits.
pub enum EditCommand<'a> {
    Server(&'a ServerCommand),
    App(&'a AppCommand),
    Pool(&'a PoolCommand),
    Jms(&'a JmsCommand),
}

pub struct Edit<'a> {
    pub command: EditCommand<'a>,
    pub keep_lock: bool,
}

impl Command for Edit<'_> {
    async fn execute(&self, session: &mut EnvironmentSession) -> Result<()> {
        let environment = match &self.command {
            EditCommand::Server(ServerCommand::Add {
                environment,
                name,
                jmx_url,
            }) => {
                let mut server = ApplicationServer::new(name);
                server.jmx_url = jmx_url.clone().unwrap_or_default();
                session.add_application_server(environment, server)?;
                environment
            }
            EditCommand::Server(ServerCommand::Remove { environment, name }) => {
                session.remove_application_server(environment, name)?;
                environment
            }
            EditCommand::App(AppCommand::Add {
                environment,
                server,
                name,
                uri,
            }) => {
                session.add_application(environment, server, Application::new(name, uri))?;
                environment
            }
            EditCommand::App(AppCommand::Toggle {
                environment,
                server,
                name,
            }) => {
                let active = session.toggle_application_active(environment, server, name)?;
                println!("{name} is now {}", if active { "active" } else { "inactive" });
                environment
            }
            EditCommand::Pool(PoolCommand::Add {
                environment,
                server,
                name,
                driver,
                url,
            }) => {
                session.add_connection_pool(
                    environment,
                    server,
                    ConnectionPool::new(name, driver, url),
                )?;
                environment
            }
            EditCommand::Jms(JmsCommand::Add {
                environment,
                server,
                name,
            }) => {
                session.add_jms_server(environment, server, JmsServer::new(name))?;
                environment
            }
        };
        persist(session, environment, self.keep_lock)
    }
}

pub struct CopyCommand {
    pub from: String,
    pub server: String,
    pub to: String,
    pub application: Option<String>,
    pub pool: Option<String>,
    pub jms: Option<String>,
    pub to_server: Option<String>,
    pub name: Option<String>,
    pub keep_lock: bool,
}

impl CopyCommand {
    fn source(&self) -> EntityRef {
        let server = self.server.clone();
        if let Some(application) = &self.application {
            EntityRef::Application {
                server,
                application: application.clone(),
            }
        } else if let Some(pool) = &self.pool {
            EntityRef::ConnectionPool {
                server,
                pool: pool.clone(),
            }
        } else if let Some(jms_server) = &self.jms {
            EntityRef::JmsServer {
                server,
                jms_server: jms_server.clone(),
            }
        } else {
            EntityRef::ApplicationServer { server }
        }
    }

    fn target(&self) -> PasteTarget {
        match self.source() {
            EntityRef::ApplicationServer { .. } => PasteTarget::Environment,
            _ => PasteTarget::ApplicationServer {
                server: self.to_server.clone().unwrap_or_else(|| self.server.clone()),
            },
        }
    }
}

impl Command for CopyCommand {
    async fn execute(&self, session: &mut EnvironmentSession) -> Result<()> {
        session.copy(&self.from, &self.source())?;
        let pasted = session.paste(&self.to, &self.target(), self.name.as_deref())?;
        println!("Pasted {pasted} into {}", self.to);
        persist(session, &self.to, self.keep_lock)
    }
}
