use anyhow::Result;
use stagehand::{Agent, EnvironmentSession};

use super::{persist, Command};
use crate::cli::{AgentCommand, EnvCommand};

pub struct EnvironmentCommand<'a> {
    pub command: &'a EnvCommand,
    pub keep_lock: bool,
}

impl Command for EnvironmentCommand<'_> {
    async fn execute(&self, session: &mut EnvironmentSession) -> Result<()> {
        match self.command {
            EnvCommand::Create { name, agent } => {
                session.create_environment(name, agent.as_deref())?;
                persist(session, name, self.keep_lock)
            }
            EnvCommand::Delete { name } => Ok(session.delete_environment(name)?),
            EnvCommand::SetAgent { name, agent } => {
                session.set_environment_agent(name, agent.as_deref())?;
                persist(session, name, self.keep_lock)
            }
        }
    }
}

pub struct AgentAdminCommand<'a> {
    pub command: &'a AgentCommand,
}

impl Command for AgentAdminCommand<'_> {
    async fn execute(&self, session: &mut EnvironmentSession) -> Result<()> {
        match self.command {
            AgentCommand::Add {
                id,
                hostname,
                port,
                cron,
            } => {
                let mut agent = Agent::new(id, hostname, *port);
                if let Some(cron) = cron {
                    agent.cron = cron.clone();
                }
                session.add_agent(agent)?;
            }
            AgentCommand::Remove { id } => session.remove_agent(id)?,
        }
        session.save_agents()?;
        Ok(())
    }
}
