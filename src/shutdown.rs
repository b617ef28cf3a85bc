use anyhow::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::session::EnvironmentSession;

/// Graceful shutdown coordinator for Stagehand
///
/// Background operations are never cut off mid-call: on shutdown the
/// scheduler keeps ticking until every watched operation has reported, or
/// until the drain timeout gives up on the stragglers.
pub struct ShutdownCoordinator {
    drain_timeout: Duration,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(330))
    }
}

impl ShutdownCoordinator {
    pub fn new(drain_timeout: Duration) -> Self {
        Self { drain_timeout }
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// Tick the session until no operation is in flight.
    ///
    /// Returns the number of operations still pending when the timeout hit,
    /// zero on a clean drain.
    pub async fn drain(&self, session: &mut EnvironmentSession) -> usize {
        let pending = session.in_flight();
        if pending == 0 {
            return 0;
        }

        info!(pending, timeout_secs = self.drain_timeout.as_secs(), "Draining in-flight operations");
        match timeout(self.drain_timeout, session.run_until_idle()).await {
            Ok(ticks) => {
                info!(ticks, "All operations reported");
                0
            }
            Err(_) => {
                let left = session.in_flight();
                warn!(left, "Timeout waiting for operations to finish");
                left
            }
        }
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::model::Config;
    use crate::remote::MockAgentClient;
    use crate::session::SessionSettings;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn idle_session_drains_immediately() {
        let store = Arc::new(InMemoryStore::new(Config::default()));
        let agents = Arc::new(MockAgentClient::new());
        let mut session = EnvironmentSession::open(
            Identity::user("alice"),
            store,
            agents,
            SessionSettings::default(),
        )
        .unwrap();

        let coordinator = ShutdownCoordinator::new(Duration::from_millis(10));
        assert_eq!(coordinator.drain(&mut session).await, 0);
    }
}
