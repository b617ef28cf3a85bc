use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConsoleLevel::Info => "INFO",
            ConsoleLevel::Warning => "WARN",
            ConsoleLevel::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub at: DateTime<Utc>,
    pub level: ConsoleLevel,
    pub text: String,
}

impl fmt::Display for ConsoleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:<5} {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.text
        )
    }
}

/// Operator-facing message pane. Every message is mirrored to tracing.
#[derive(Debug, Default)]
pub struct ConsoleLog {
    messages: Vec<ConsoleMessage>,
}

impl ConsoleLog {
    pub fn info(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!(console = true, "{}", text);
        self.push(ConsoleLevel::Info, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!(console = true, "{}", text);
        self.push(ConsoleLevel::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        error!(console = true, "{}", text);
        self.push(ConsoleLevel::Error, text);
    }

    fn push(&mut self, level: ConsoleLevel, text: String) {
        self.messages.push(ConsoleMessage {
            at: Utc::now(),
            level,
            text,
        });
    }

    pub fn messages(&self) -> &[ConsoleMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ConsoleMessage> {
        self.messages.last()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConsoleMessage> {
        self.messages
            .iter()
            .filter(|m| m.level == ConsoleLevel::Error)
    }

    /// Hands the pending messages to the caller, e.g. for printing.
    pub fn take(&mut self) -> Vec<ConsoleMessage> {
        std::mem::take(&mut self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_keep_their_level_and_order() {
        let mut log = ConsoleLog::default();
        log.info("saved prod");
        log.error("Update of prod failed");

        assert_eq!(log.messages().len(), 2);
        assert_eq!(log.errors().count(), 1);
        assert!(log.last().unwrap().to_string().contains("ERROR Update of prod failed"));

        let taken = log.take();
        assert_eq!(taken.len(), 2);
        assert!(log.messages().is_empty());
    }
}
