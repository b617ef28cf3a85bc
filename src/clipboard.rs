//! Session-scoped clipboard
//!
//! Holds a deep copy of the last copied configuration entity. Copy always
//! overwrites, paste never consumes, so one copy can be pasted into many
//! targets. The slot does not care what it holds; callers check the kind
//! with [`ClipboardEntity::kind`] or the typed accessors before use.

use tracing::debug;

use crate::error::ConsoleError;
use crate::model::{
    Application, ApplicationServer, ConnectionPool, EntityKind, JmsServer, LogFile, Named,
    Notifier, Publisher,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardEntity {
    ApplicationServer(ApplicationServer),
    Application(Application),
    ConnectionPool(ConnectionPool),
    JmsServer(JmsServer),
    Notifier(Notifier),
    Publisher(Publisher),
    LogFile(LogFile),
}

impl ClipboardEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            ClipboardEntity::ApplicationServer(_) => EntityKind::ApplicationServer,
            ClipboardEntity::Application(_) => EntityKind::Application,
            ClipboardEntity::ConnectionPool(_) => EntityKind::ConnectionPool,
            ClipboardEntity::JmsServer(_) => EntityKind::JmsServer,
            ClipboardEntity::Notifier(_) => EntityKind::Notifier,
            ClipboardEntity::Publisher(_) => EntityKind::Publisher,
            ClipboardEntity::LogFile(_) => EntityKind::LogFile,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ClipboardEntity::ApplicationServer(e) => e.name(),
            ClipboardEntity::Application(e) => e.name(),
            ClipboardEntity::ConnectionPool(e) => e.name(),
            ClipboardEntity::JmsServer(e) => e.name(),
            ClipboardEntity::Notifier(e) => e.name(),
            ClipboardEntity::Publisher(e) => e.name(),
            ClipboardEntity::LogFile(e) => e.name(),
        }
    }

    /// Gives the held entity a new name, used when pasting next to the original.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        match &mut self {
            ClipboardEntity::ApplicationServer(e) => e.set_name(name),
            ClipboardEntity::Application(e) => e.set_name(name),
            ClipboardEntity::ConnectionPool(e) => e.set_name(name),
            ClipboardEntity::JmsServer(e) => e.set_name(name),
            ClipboardEntity::Notifier(e) => e.set_name(name),
            ClipboardEntity::Publisher(e) => e.set_name(name),
            ClipboardEntity::LogFile(e) => e.set_name(name),
        }
        self
    }
}

#[derive(Debug, Default)]
pub struct Clipboard {
    slot: Option<ClipboardEntity>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entity`, replacing whatever was copied before.
    pub fn copy(&mut self, entity: ClipboardEntity) {
        debug!(kind = %entity.kind(), name = %entity.name(), "Copied to clipboard");
        self.slot = Some(entity);
    }

    /// Returns a fresh clone of the held entity, leaving the slot untouched.
    pub fn paste(&self) -> Option<ClipboardEntity> {
        self.slot.clone()
    }

    pub fn paste_or_err(&self) -> Result<ClipboardEntity, ConsoleError> {
        self.paste().ok_or(ConsoleError::EmptyClipboard)
    }

    pub fn peek_kind(&self) -> Option<EntityKind> {
        self.slot.as_ref().map(ClipboardEntity::kind)
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paste_returns_deep_equal_copy_and_is_repeatable() {
        let mut server = ApplicationServer::new("web01");
        server.applications.push(Application::new("shop", "file:/shop.ear"));

        let mut clipboard = Clipboard::new();
        clipboard.copy(ClipboardEntity::ApplicationServer(server.clone()));

        let first = clipboard.paste().unwrap();
        let second = clipboard.paste().unwrap();
        assert_eq!(first, ClipboardEntity::ApplicationServer(server.clone()));
        assert_eq!(first, second);

        // Mutating a pasted value never reaches back into the slot.
        if let ClipboardEntity::ApplicationServer(mut pasted) = first {
            pasted.applications.clear();
        }
        assert_eq!(clipboard.paste().unwrap(), ClipboardEntity::ApplicationServer(server));
    }

    #[test]
    fn copy_overwrites_unconditionally() {
        let mut clipboard = Clipboard::new();
        clipboard.copy(ClipboardEntity::Notifier(Notifier::new("ops")));
        clipboard.copy(ClipboardEntity::JmsServer(JmsServer::new("orders-q")));
        assert_eq!(clipboard.peek_kind(), Some(EntityKind::JmsServer));
    }

    #[test]
    fn empty_clipboard_paste() {
        let mut clipboard = Clipboard::new();
        assert!(clipboard.paste().is_none());
        assert_eq!(clipboard.paste_or_err(), Err(ConsoleError::EmptyClipboard));

        clipboard.copy(ClipboardEntity::Notifier(Notifier::new("ops")));
        clipboard.clear();
        assert!(clipboard.is_empty());
    }

    #[test]
    fn renamed_changes_only_the_name() {
        let pool = ConnectionPool::new("ds1", "org.h2.Driver", "jdbc:h2:mem:");
        let renamed = ClipboardEntity::ConnectionPool(pool.clone()).renamed("ds2");
        match renamed {
            ClipboardEntity::ConnectionPool(copy) => {
                assert_eq!(copy.name, "ds2");
                assert_eq!(copy.url, pool.url);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
