use anyhow::Result;
use stagehand::EnvironmentSession;

use super::Command;

pub struct LockCommand {
    pub environment: String,
    pub release: bool,
}

impl LockCommand {
    pub fn acquire(environment: String) -> Self {
        Self {
            environment,
            release: false,
        }
    }

    pub fn release(environment: String) -> Self {
        Self {
            environment,
            release: true,
        }
    }
}

impl Command for LockCommand {
    async fn execute(&self, session: &mut EnvironmentSession) -> Result<()> {
        if self.release {
            session.release_lock(&self.environment)?;
            println!("Environment {} unlocked", self.environment);
        } else {
            session.acquire_lock(&self.environment)?;
            println!(
                "Environment {} locked by {}",
                self.environment,
                session.identity().user_id()
            );
        }
        Ok(())
    }
}
