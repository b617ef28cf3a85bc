//! Background agent operations driven through the session scheduler.

mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use fixtures::{editor, open, sample_config, settle, GatedAgent, ScriptedAgent};
use stagehand::{
    AgentCallError, AgentOperation, Capability, ConsoleError, ConsoleLevel, Identity,
    InMemoryStore, RemoteTarget, UserId,
};

fn orders_q() -> RemoteTarget {
    RemoteTarget::JmsServer {
        server: "srv1".to_string(),
        jms_server: "orders-q".to_string(),
    }
}

#[tokio::test]
async fn network_failure_yields_one_failure_entry() {
    let store = InMemoryStore::new(sample_config());
    let agent = ScriptedAgent::failing(AgentCallError::Transport("connection reset".to_string()));
    let mut session = open(editor("alice"), &store, Arc::new(agent.clone()));
    let before = session.config().environment("prod").unwrap().clone();

    session.update("prod", orders_q()).unwrap();
    settle(&mut session).await;
    // Further ticks never repeat the terminal action.
    session.tick();
    session.tick();

    let env = session.config().environment("prod").unwrap();
    let failures: Vec<&str> = env
        .journal
        .iter()
        .filter(|entry| entry.contains("orders-q") && entry.contains("failed"))
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("connection reset"));

    assert_eq!(env.application_servers, before.application_servers);
    assert_eq!(env.lock, before.lock);
    assert!(!env.updated);
    assert!(session
        .console()
        .messages()
        .iter()
        .any(|m| m.level == ConsoleLevel::Error && m.text.contains("orders-q")));
    assert_eq!(agent.calls().len(), 1);
}

#[tokio::test]
async fn dirty_flag_survives_a_failed_update_elsewhere() {
    let store = InMemoryStore::new(sample_config());
    let agent = ScriptedAgent::failing(AgentCallError::Remote("not up to date".to_string()));
    let mut session = open(editor("alice"), &store, Arc::new(agent));

    session.check_status("prod", orders_q()).unwrap();
    session
        .toggle_jms_server_active("prod", "srv1", "orders-q")
        .unwrap();
    settle(&mut session).await;

    let env = session.config().environment("prod").unwrap();
    assert!(env.updated);
    assert!(env.journal.last().unwrap().contains("not up to date"));
}

#[tokio::test]
async fn unsaved_changes_block_updates_before_any_rpc() {
    let store = InMemoryStore::new(sample_config());
    let agent = ScriptedAgent::answering("updated");
    let mut session = open(editor("alice"), &store, Arc::new(agent.clone()));
    session
        .toggle_application_active("prod", "srv1", "shop")
        .unwrap();

    let err = session
        .update(
            "prod",
            RemoteTarget::Application {
                server: "srv1".to_string(),
                application: "shop".to_string(),
            },
        )
        .unwrap_err();

    assert!(matches!(err, ConsoleError::UnsavedChanges { .. }));
    assert_eq!(session.in_flight(), 0);
    tokio::task::yield_now().await;
    assert!(agent.calls().is_empty());

    // Saving clears the way.
    session.save_environment("prod", false).unwrap();
    session
        .update(
            "prod",
            RemoteTarget::Application {
                server: "srv1".to_string(),
                application: "shop".to_string(),
            },
        )
        .unwrap();
    settle(&mut session).await;
    assert_eq!(agent.calls().len(), 1);
    assert_eq!(agent.calls()[0].args, vec!["prod", "srv1", "shop"]);
}

#[tokio::test]
async fn request_returns_while_the_agent_is_still_busy() {
    let store = InMemoryStore::new(sample_config());
    let agent = GatedAgent::default();
    let mut session = open(editor("alice"), &store, Arc::new(agent.clone()));

    let ticket = session.update("prod", RemoteTarget::Environment).unwrap();
    assert_eq!(session.in_flight(), 1);

    // Let the background task reach the agent, then keep ticking: nothing
    // blocks and nothing completes.
    while agent.started() == 0 {
        tokio::task::yield_now().await;
    }
    for _ in 0..3 {
        let report = session.tick();
        assert_eq!(report.finished, 0);
    }
    assert_eq!(session.in_flight(), 1);

    agent.open_gate();
    settle(&mut session).await;

    let journal = &session.config().environment("prod").unwrap().journal;
    assert_eq!(journal.len(), 2);
    assert_eq!(
        journal.last(),
        Some(format!("{} succeeded: done", ticket.label).as_str())
    );
}

#[tokio::test]
async fn abandoned_operation_drains_without_reporting() {
    let store = InMemoryStore::new(sample_config());
    let agent = GatedAgent::default();
    let mut session = open(editor("alice"), &store, Arc::new(agent.clone()));

    let ticket = session
        .request("prod", AgentOperation::Version, RemoteTarget::Environment)
        .unwrap();
    while agent.started() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(session.abandon(&ticket));
    session.tick();
    assert_eq!(session.in_flight(), 1);

    agent.open_gate();
    settle(&mut session).await;

    let journal = &session.config().environment("prod").unwrap().journal;
    assert_eq!(journal.len(), 1);
    assert_eq!(session.metrics().stats().abandoned, 1);
    assert_eq!(session.metrics().stats().outstanding(), 0);
}

#[tokio::test]
async fn missing_agent_reports_agent_not_found() {
    let mut config = sample_config();
    config.agents.clear();
    let store = InMemoryStore::new(config);
    let agent = ScriptedAgent::answering("unused");
    let mut session = open(editor("alice"), &store, Arc::new(agent.clone()));

    session.update("prod", orders_q()).unwrap();
    settle(&mut session).await;

    let env = session.config().environment("prod").unwrap();
    assert!(env.journal.last().unwrap().contains("Agent agent-1 not found"));
    assert!(agent.calls().is_empty());
    assert_eq!(session.metrics().stats().failed, 1);
}

#[tokio::test(start_paused = true)]
async fn hanging_agent_is_cut_off_by_the_call_timeout() {
    let store = InMemoryStore::new(sample_config());
    let agent = GatedAgent::default();
    let mut session = open(editor("alice"), &store, Arc::new(agent));

    session.update("prod", orders_q()).unwrap();
    tokio::time::timeout(Duration::from_secs(60), session.run_until_idle())
        .await
        .unwrap();

    let env = session.config().environment("prod").unwrap();
    assert!(env.journal.last().unwrap().contains("no answer from agent"));
}

#[tokio::test]
async fn updates_respect_capabilities_and_foreign_locks() {
    let store = InMemoryStore::new(sample_config());
    let agent = ScriptedAgent::answering("ok");

    let reader = Identity::user("carol").with_capability(Capability::EditResources);
    let mut session = open(reader, &store, Arc::new(agent.clone()));
    assert!(matches!(
        session.update("prod", orders_q()),
        Err(ConsoleError::PermissionDenied {
            capability: Capability::UpdateResources,
            ..
        })
    ));
    // Read-only checks need no capability.
    session.check_status("prod", orders_q()).unwrap();
    settle(&mut session).await;

    let mut alice = open(editor("alice"), &store, Arc::new(agent.clone()));
    alice.acquire_lock("prod").unwrap();
    let mut bob = open(editor("bob"), &store, Arc::new(agent));
    assert!(matches!(
        bob.update("prod", orders_q()),
        Err(ConsoleError::Locked { ref owner, .. }) if owner == &UserId::from("alice")
    ));
}

#[tokio::test]
async fn reload_keeps_unsaved_operation_entries() {
    let store = InMemoryStore::new(sample_config());
    let mut session = open(editor("alice"), &store, Arc::new(ScriptedAgent::answering("running")));

    session.check_status("prod", orders_q()).unwrap();
    settle(&mut session).await;
    let before: Vec<String> = session.config().environment("prod").unwrap().journal.entries().to_vec();
    assert_eq!(before.len(), 2);

    session.reload().unwrap();

    let after = session.config().environment("prod").unwrap().journal.entries().to_vec();
    assert_eq!(after, before);
    assert!(session.console().last().unwrap().text.contains("prod (2)"));

    // Still only in the session until saved.
    assert!(store.snapshot().environments[0].journal.is_empty());
    session.save_environment("prod", false).unwrap();
    assert_eq!(store.snapshot().environments[0].journal.entries(), before.as_slice());
}
