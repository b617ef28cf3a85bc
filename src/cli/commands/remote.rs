use anyhow::{bail, Result};
use tracing::warn;

use stagehand::{shutdown_signal, AgentOperation, EnvironmentSession, RemoteTarget, ShutdownCoordinator};

use super::{print_console, Command};

pub struct RemoteCommand {
    pub operation: AgentOperation,
    pub environment: String,
    pub server: Option<String>,
    pub application: Option<String>,
    pub pool: Option<String>,
    pub jms: Option<String>,
    pub log_file: Option<String>,
    pub shutdown: ShutdownCoordinator,
}

impl RemoteCommand {
    fn target(&self) -> Result<RemoteTarget> {
        let target = match (&self.server, &self.log_file) {
            (Some(_), Some(_)) => bail!("--server and --log-file cannot be combined"),
            (None, Some(log_file)) => RemoteTarget::LogFile {
                log_file: log_file.clone(),
            },
            (None, None) => RemoteTarget::Environment,
            (Some(server), None) => {
                let server = server.clone();
                match (&self.application, &self.pool, &self.jms) {
                    (Some(application), None, None) => RemoteTarget::Application {
                        server,
                        application: application.clone(),
                    },
                    (None, Some(pool), None) => RemoteTarget::ConnectionPool {
                        server,
                        pool: pool.clone(),
                    },
                    (None, None, Some(jms_server)) => RemoteTarget::JmsServer {
                        server,
                        jms_server: jms_server.clone(),
                    },
                    (None, None, None) => RemoteTarget::ApplicationServer { server },
                    _ => bail!("choose at most one of --application, --pool and --jms"),
                }
            }
        };
        Ok(target)
    }
}

impl Command for RemoteCommand {
    async fn execute(&self, session: &mut EnvironmentSession) -> Result<()> {
        let ticket = session.request(&self.environment, self.operation, self.target()?)?;
        print_console(session);
        println!("Waiting for agent, Ctrl-C to stop waiting...");

        let interrupted = tokio::select! {
            _ = session.run_until_idle() => false,
            _ = shutdown_signal() => true,
        };
        if interrupted && session.abandon(&ticket) {
            // The call keeps running until its timeout; let it end cleanly.
            let left = self.shutdown.drain(session).await;
            if left > 0 {
                warn!(left, "Exiting with agent calls still running");
            }
        }
        print_console(session);

        // Journal entries are only kept once saved. Locks are left as they were.
        if let Err(e) = session.save_environment(&self.environment, false) {
            warn!(error = %e, "Journal of {} not saved", self.environment);
            println!("Journal not saved: {e}");
        }

        let failed = session.metrics().stats().failed;
        if failed > 0 {
            bail!("{} failed", ticket.label);
        }
        Ok(())
    }
}
