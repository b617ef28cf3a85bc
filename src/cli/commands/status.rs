use anyhow::Result;
use stagehand::EnvironmentSession;

use super::Command;

pub struct StatusCommand;

impl Command for StatusCommand {
    async fn execute(&self, session: &mut EnvironmentSession) -> Result<()> {
        let config = session.config();
        println!("STAGEHAND STATUS");
        println!("================");
        println!();

        if config.environments.is_empty() {
            println!("No environments configured.");
        }
        for env in &config.environments {
            let lock = match env.lock.owner() {
                Some(owner) => format!("locked by {owner}"),
                None => "unlocked".to_string(),
            };
            println!(
                "{} ({lock}, agent: {}, {} servers, {} journal entries)",
                env.name,
                env.agent.as_deref().unwrap_or("-"),
                env.application_servers.len(),
                env.journal.len()
            );
            for server in &env.application_servers {
                println!(
                    "   {} [{}] {} applications, {} pools, {} JMS servers",
                    server.name,
                    if server.active { "active" } else { "inactive" },
                    server.applications.len(),
                    server.connection_pools.len(),
                    server.jms_servers.len()
                );
            }
        }

        println!();
        println!("AGENTS:");
        if config.agents.is_empty() {
            println!("   none");
        }
        for agent in &config.agents {
            println!("   {} {}:{} cron '{}'", agent.id, agent.hostname, agent.port, agent.cron);
        }
        Ok(())
    }
}
