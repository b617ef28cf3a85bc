use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::ConsoleError;
use crate::model::collection::Named;
use crate::model::EntityKind;

static CRON_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*|\?|[0-9A-Za-z]+([-/,#][0-9A-Za-z]+)*|\*/[0-9]+|[0-9]+[LW]?|L)$")
        .expect("cron field pattern is valid")
});

/// A remote process executing provisioning operations for environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub hostname: String,
    pub port: u16,
    /// Schedule of the agent's own periodic checks.
    #[serde(default = "default_cron")]
    pub cron: String,
    #[serde(default)]
    pub max_managed_environments: u32,
    #[serde(default)]
    pub max_active_application_servers: u32,
}

fn default_cron() -> String {
    "0 0 * * * ?".to_string()
}

impl Agent {
    pub fn new(id: impl Into<String>, hostname: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            port,
            cron: default_cron(),
            max_managed_environments: 0,
            max_active_application_servers: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ConsoleError> {
        if self.id.trim().is_empty() {
            return Err(ConsoleError::invalid(EntityKind::Agent, "id must not be empty"));
        }
        if self.hostname.trim().is_empty() {
            return Err(ConsoleError::invalid(
                EntityKind::Agent,
                format!("agent {} has no hostname", self.id),
            ));
        }
        if self.port == 0 {
            return Err(ConsoleError::invalid(
                EntityKind::Agent,
                format!("agent {} has no port", self.id),
            ));
        }
        validate_cron(&self.cron)
    }
}

impl Named for Agent {
    const KIND: EntityKind = EntityKind::Agent;

    fn name(&self) -> &str {
        &self.id
    }

    fn set_name(&mut self, name: String) {
        self.id = name;
    }
}

/// Accepts classic 5-field and Quartz-style 6/7-field expressions.
pub fn validate_cron(expression: &str) -> Result<(), ConsoleError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if !(5..=7).contains(&fields.len()) {
        return Err(ConsoleError::invalid(
            EntityKind::Agent,
            format!(
                "cron expression '{expression}' has {} fields, expected 5 to 7",
                fields.len()
            ),
        ));
    }
    if let Some(bad) = fields.iter().find(|field| !CRON_FIELD.is_match(field)) {
        return Err(ConsoleError::invalid(
            EntityKind::Agent,
            format!("cron expression '{expression}' has an invalid field '{bad}'"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_cron_expressions() {
        for expression in [
            "0 0 * * * ?",
            "*/5 * * * *",
            "0 15 10 ? * MON-FRI",
            "0 0 12 1/5 * ? 2030",
            "0 0 L * *",
        ] {
            assert!(validate_cron(expression).is_ok(), "{expression}");
        }
    }

    #[test]
    fn rejects_malformed_cron_expressions() {
        assert!(validate_cron("* *").is_err());
        assert!(validate_cron("0 0 * * * ? 2030 extra").is_err());
        assert!(validate_cron("0 0 * * $").is_err());
    }

    #[test]
    fn validate_checks_endpoint() {
        assert!(Agent::new("a1", "host", 4000).validate().is_ok());
        assert!(Agent::new("a1", "", 4000).validate().is_err());
        assert!(Agent::new("a1", "host", 0).validate().is_err());
    }
}
