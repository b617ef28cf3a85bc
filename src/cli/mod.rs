use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stagehand::{AgentOperation, Capability};

pub mod commands;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Environment session coordinator for the deployment admin console")]
#[command(long_about = "Stagehand edits the shared environment configuration under a per-environment \
                       single-writer lock, journals every change, and runs agent operations in the \
                       background while the console stays responsive.")]
pub struct Cli {
    /// Configuration document to work on
    #[arg(long, global = true, help = "Path of the configuration store (overrides store.path)")]
    pub store: Option<PathBuf>,
    /// Acting user
    #[arg(long, global = true, help = "User id to act as (defaults to $USER)")]
    pub user: Option<String>,
    /// Act with administrator rights
    #[arg(long, global = true)]
    pub admin: bool,
    /// Capabilities granted to the acting user
    #[arg(long = "grant", global = true, help = "Grant a capability, e.g. edit-applications (repeatable)")]
    pub grants: Vec<Capability>,
    /// Keep the environment locked after saving
    #[arg(long, global = true)]
    pub keep_lock: bool,
    /// Directory holding stagehand.toml
    #[arg(long, global = true, help = "Directory to read stagehand.toml and .stagehand-rc from")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show environments, their locks and agents
    Status,
    /// Print the change journal of an environment
    Journal { environment: String },
    /// Lock an environment for exclusive editing
    Lock { environment: String },
    /// Release an environment lock
    Unlock { environment: String },
    /// Create or delete environments (administrators)
    Env {
        #[command(subcommand)]
        command: EnvCommand,
    },
    /// Manage agents (administrators)
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },
    /// Add or remove application servers
    Server {
        #[command(subcommand)]
        command: ServerCommand,
    },
    /// Add or toggle applications
    App {
        #[command(subcommand)]
        command: AppCommand,
    },
    /// Add a JDBC connection pool
    Pool {
        #[command(subcommand)]
        command: PoolCommand,
    },
    /// Add a JMS server
    Jms {
        #[command(subcommand)]
        command: JmsCommand,
    },
    /// Copy an application server, or one of its children, into another place
    Copy {
        /// Environment to copy from
        from: String,
        /// Application server to copy, or the parent of the copied child
        server: String,
        /// Environment to paste into
        to: String,
        #[arg(long, help = "Copy this application instead of the whole server")]
        application: Option<String>,
        #[arg(long, help = "Copy this JDBC connection pool instead of the whole server")]
        pool: Option<String>,
        #[arg(long, help = "Copy this JMS server instead of the whole server")]
        jms: Option<String>,
        #[arg(long, help = "Server to paste a child into (defaults to SERVER)")]
        to_server: Option<String>,
        #[arg(long, help = "Name of the pasted copy")]
        name: Option<String>,
    },
    /// Run an agent operation and wait for its outcome
    Remote {
        /// version, status, check, update or view-file
        operation: AgentOperation,
        environment: String,
        #[arg(long)]
        server: Option<String>,
        #[arg(long, requires = "server")]
        application: Option<String>,
        #[arg(long, requires = "server")]
        pool: Option<String>,
        #[arg(long, requires = "server")]
        jms: Option<String>,
        #[arg(long)]
        log_file: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum EnvCommand {
    Create {
        name: String,
        #[arg(long)]
        agent: Option<String>,
    },
    Delete {
        name: String,
    },
    /// Assign an agent, or remove the assignment when AGENT is omitted
    SetAgent {
        name: String,
        agent: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AgentCommand {
    Add {
        id: String,
        hostname: String,
        port: u16,
        #[arg(long, help = "Schedule expression with 5 to 7 fields")]
        cron: Option<String>,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ServerCommand {
    Add {
        environment: String,
        name: String,
        #[arg(long)]
        jmx_url: Option<String>,
    },
    Remove {
        environment: String,
        name: String,
    },
}

#[derive(Subcommand)]
pub enum AppCommand {
    Add {
        environment: String,
        server: String,
        name: String,
        uri: String,
    },
    Toggle {
        environment: String,
        server: String,
        name: String,
    },
}

#[derive(Subcommand)]
pub enum PoolCommand {
    Add {
        environment: String,
        server: String,
        name: String,
        driver: String,
        url: String,
    },
}

#[derive(Subcommand)]
pub enum JmsCommand {
    Add {
        environment: String,
        server: String,
        name: String,
    },
}
