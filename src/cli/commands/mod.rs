use anyhow::{Context, Result};
use std::sync::Arc;

use stagehand::{
    CommandAgentClient, EnvironmentSession, Identity, JsonFileStore, SessionSettings,
    StagehandConfig,
};

use crate::cli::Cli;

pub mod edit;
pub mod environment;
pub mod journal;
pub mod lock;
pub mod remote;
pub mod status;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, session: &mut EnvironmentSession) -> Result<()>;
}

/// Identity described by the global flags.
pub fn identity_from(cli: &Cli) -> Identity {
    let user = cli
        .user
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "operator".to_string());
    let identity = if cli.admin {
        Identity::admin(user)
    } else {
        Identity::user(user)
    };
    identity.with_capabilities(cli.grants.iter().copied())
}

/// Opens a session on the configured store and agent bridge.
pub fn open_session(cli: &Cli, config: &StagehandConfig) -> Result<EnvironmentSession> {
    let path = cli
        .store
        .clone()
        .unwrap_or_else(|| config.store.path.clone().into());
    let store = Arc::new(JsonFileStore::new(&path));
    let agents = Arc::new(CommandAgentClient::new(config.agents.rpc_command.clone()));

    EnvironmentSession::open(
        identity_from(cli),
        store,
        agents,
        SessionSettings::from(config),
    )
    .with_context(|| format!("Failed to open configuration store {}", path.display()))
}

/// Prints what the session reported on its console since the last call.
pub fn print_console(session: &mut EnvironmentSession) {
    for message in session.console_mut().take() {
        println!("{message}");
    }
}

/// Saves an edited environment, releasing the lock unless asked to keep it.
pub fn persist(session: &mut EnvironmentSession, environment: &str, keep_lock: bool) -> Result<()> {
    session
        .save_environment(environment, !keep_lock)
        .with_context(|| format!("Failed to save environment {environment}"))
}
