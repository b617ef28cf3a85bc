// Change journal: append-only, human-readable audit log kept per environment
// and persisted with it. No dedup, no cap, no removal API.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Environment;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeJournal {
    events: Vec<String>,
}

impl ChangeJournal {
    pub fn append(&mut self, message: impl Into<String>) {
        self.events.push(message.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.events
    }

    pub fn last(&self) -> Option<&str> {
        self.events.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(String::as_str)
    }

    /// True when `earlier` is a prefix of this journal, i.e. this journal
    /// only appended to it.
    pub fn extends(&self, earlier: &ChangeJournal) -> bool {
        self.events.starts_with(&earlier.events)
    }
}

/// Appends `message` to the environment's journal.
pub fn append(environment: &mut Environment, message: impl Into<String>) {
    let message = message.into();
    debug!(environment = %environment.name, entry = %message, "Journal entry appended");
    environment.journal.append(message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_in_insertion_order_without_dedup() {
        let mut env = Environment::new("prod");
        append(&mut env, "Add J2EE application server web01");
        append(&mut env, "Update requested");
        append(&mut env, "Update requested");

        assert_eq!(env.journal.len(), 3);
        assert_eq!(env.journal.entries()[0], "Add J2EE application server web01");
        assert_eq!(env.journal.last(), Some("Update requested"));
    }

    #[test]
    fn earlier_entries_are_stable() {
        let mut journal = ChangeJournal::default();
        journal.append("first");
        let before: Vec<String> = journal.entries().to_vec();
        journal.append("second");
        assert_eq!(&journal.entries()[..before.len()], before.as_slice());
    }

    #[test]
    fn extends_only_its_own_prefixes() {
        let mut stored = ChangeJournal::default();
        stored.append("bob: added notifier ops");

        let mut ours = stored.clone();
        ours.append("alice: added notifier oncall");
        assert!(ours.extends(&stored));
        assert!(ours.extends(&ChangeJournal::default()));

        let mut diverged = ChangeJournal::default();
        diverged.append("alice: added notifier oncall");
        assert!(!diverged.extends(&stored));
        assert!(!stored.extends(&ours));
    }

    #[test]
    fn serializes_as_plain_list() {
        let mut journal = ChangeJournal::default();
        journal.append("a");
        assert_eq!(serde_json::to_string(&journal).unwrap(), r#"["a"]"#);
    }
}
