use anyhow::Result;
use clap::Parser;

use stagehand::{init_telemetry, shutdown_telemetry, ShutdownCoordinator, StagehandConfig};

mod cli;

use cli::commands::edit::{CopyCommand, Edit, EditCommand};
use cli::commands::environment::{AgentAdminCommand, EnvironmentCommand};
use cli::commands::journal::JournalCommand;
use cli::commands::lock::LockCommand;
use cli::commands::remote::RemoteCommand;
use cli::commands::status::StatusCommand;
use cli::commands::{open_session, print_console, Command};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    StagehandConfig::load_env_file()?;
    let config = match &cli.config {
        Some(dir) => StagehandConfig::load_from(dir)?,
        None => stagehand::config()?.clone(),
    };
    init_telemetry(&config.observability)?;

    let result = tokio::runtime::Runtime::new()?.block_on(async { run(&cli, &config).await });

    shutdown_telemetry();
    result
}

async fn run(cli: &Cli, config: &StagehandConfig) -> Result<()> {
    let mut session = open_session(cli, config)?;
    let keep_lock = cli.keep_lock;

    let outcome = match &cli.command {
        Commands::Status => StatusCommand.execute(&mut session).await,
        Commands::Journal { environment } => {
            JournalCommand {
                environment: environment.clone(),
            }
            .execute(&mut session)
            .await
        }
        Commands::Lock { environment } => {
            LockCommand::acquire(environment.clone())
                .execute(&mut session)
                .await
        }
        Commands::Unlock { environment } => {
            LockCommand::release(environment.clone())
                .execute(&mut session)
                .await
        }
        Commands::Env { command } => {
            EnvironmentCommand { command, keep_lock }
                .execute(&mut session)
                .await
        }
        Commands::Agent { command } => AgentAdminCommand { command }.execute(&mut session).await,
        Commands::Server { command } => {
            edit(EditCommand::Server(command), keep_lock, &mut session).await
        }
        Commands::App { command } => edit(EditCommand::App(command), keep_lock, &mut session).await,
        Commands::Pool { command } => {
            edit(EditCommand::Pool(command), keep_lock, &mut session).await
        }
        Commands::Jms { command } => edit(EditCommand::Jms(command), keep_lock, &mut session).await,
        Commands::Copy {
            from,
            server,
            to,
            application,
            pool,
            jms,
            to_server,
            name,
        } => {
            CopyCommand {
                from: from.clone(),
                server: server.clone(),
                to: to.clone(),
                application: application.clone(),
                pool: pool.clone(),
                jms: jms.clone(),
                to_server: to_server.clone(),
                name: name.clone(),
                keep_lock,
            }
            .execute(&mut session)
            .await
        }
        Commands::Remote {
            operation,
            environment,
            server,
            application,
            pool,
            jms,
            log_file,
        } => {
            RemoteCommand {
                operation: *operation,
                environment: environment.clone(),
                server: server.clone(),
                application: application.clone(),
                pool: pool.clone(),
                jms: jms.clone(),
                log_file: log_file.clone(),
                shutdown: ShutdownCoordinator::new(config.scheduler.drain_timeout()),
            }
            .execute(&mut session)
            .await
        }
    };

    print_console(&mut session);
    session.logout();
    if config.observability.metrics_enabled {
        session.metrics().log_stats();
    }
    outcome
}

async fn edit(command: EditCommand<'_>, keep_lock: bool, session: &mut stagehand::EnvironmentSession) -> Result<()> {
    Edit { command, keep_lock }.execute(session).await
}
