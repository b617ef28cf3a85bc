use anyhow::Result;
use stagehand::EnvironmentSession;

use super::Command;

pub struct JournalCommand {
    pub environment: String,
}

impl Command for JournalCommand {
    async fn execute(&self, session: &mut EnvironmentSession) -> Result<()> {
        let env = session.config().environment(&self.environment)?;
        if env.journal.is_empty() {
            println!("Journal of {} is empty.", env.name);
            return Ok(());
        }
        for (index, entry) in env.journal.iter().enumerate() {
            println!("{:>4}  {entry}", index + 1);
        }
        Ok(())
    }
}
