//! Shared fixtures for the integration tests: a sample configuration tree,
//! scripted agent clients and session helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use stagehand::{
    Agent, AgentCallError, AgentClient, AgentEndpoint, AgentRequest, Application,
    ApplicationServer, Capability, Config, ConnectionPool, Environment, EnvironmentSession,
    Identity, InMemoryStore, JmsServer, LogFile, SessionSettings,
};

/// prod and qa, both served by agent-1. prod has one server with an
/// application, a pool and the orders-q JMS server.
pub fn sample_config() -> Config {
    let mut srv1 = ApplicationServer::new("srv1");
    srv1.applications.push(Application::new("shop", "mvn:com.example/shop/1.0/ear"));
    srv1.connection_pools.push(ConnectionPool::new(
        "ds1",
        "oracle.jdbc.OracleDriver",
        "jdbc:oracle:thin:@db:1521:prod",
    ));
    srv1.jms_servers.push(JmsServer::new("orders-q"));

    let mut prod = Environment::new("prod").with_agent("agent-1");
    prod.application_servers.push(srv1);
    prod.log_files.push(LogFile::new("server-log", "/var/log/srv1/server.log"));

    let mut config = Config::default();
    config.environments.push(prod);
    config
        .environments
        .push(Environment::new("qa").with_agent("agent-1"));
    config.agents.push(Agent::new("agent-1", "deploy-host", 4000));
    config
}

pub fn editor(user: &str) -> Identity {
    Identity::user(user).with_capabilities(Capability::ALL.iter().copied())
}

pub fn settings() -> SessionSettings {
    SessionSettings {
        call_timeout: Duration::from_secs(5),
        tick_interval: Duration::from_millis(5),
    }
}

pub fn open(
    identity: Identity,
    store: &InMemoryStore,
    agents: Arc<dyn AgentClient>,
) -> EnvironmentSession {
    EnvironmentSession::open(identity, Arc::new(store.clone()), agents, settings())
        .expect("session opens on an in-memory store")
}

/// Answers every call with the same result and records what it was asked.
#[derive(Clone)]
pub struct ScriptedAgent {
    answer: Result<String, AgentCallError>,
    calls: Arc<Mutex<Vec<AgentRequest>>>,
}

impl ScriptedAgent {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn failing(error: AgentCallError) -> Self {
        Self {
            answer: Err(error),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<AgentRequest> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl AgentClient for ScriptedAgent {
    async fn call(
        &self,
        _endpoint: &AgentEndpoint,
        request: &AgentRequest,
    ) -> Result<String, AgentCallError> {
        self.calls.lock().expect("calls lock").push(request.clone());
        self.answer.clone()
    }
}

/// Blocks every call until the test opens the gate.
#[derive(Clone, Default)]
pub struct GatedAgent {
    gate: Arc<Notify>,
    started: Arc<AtomicUsize>,
}

impl GatedAgent {
    pub fn open_gate(&self) {
        self.gate.notify_waiters();
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentClient for GatedAgent {
    async fn call(
        &self,
        _endpoint: &AgentEndpoint,
        _request: &AgentRequest,
    ) -> Result<String, AgentCallError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok("done".to_string())
    }
}

/// Ticks until nothing is in flight, giving background tasks a chance to run.
pub async fn settle(session: &mut EnvironmentSession) {
    tokio::time::timeout(Duration::from_secs(5), session.run_until_idle())
        .await
        .expect("operations settle");
}
