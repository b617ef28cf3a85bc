use thiserror::Error;

use crate::identity::{Capability, UserId};
use crate::model::EntityKind;

/// Errors raised synchronously by session actions.
///
/// Every variant is recoverable: the action that produced it has left the
/// configuration tree untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("User {user} is not allowed to {capability}")]
    PermissionDenied { user: UserId, capability: Capability },

    #[error("User {user} must be an administrator to {action}")]
    AdminRequired { user: UserId, action: String },

    #[error("Environment {environment} is locked by {owner}")]
    Locked { environment: String, owner: UserId },

    #[error("Environment {environment} is locked by {owner}, not by {user}")]
    NotOwner {
        environment: String,
        owner: UserId,
        user: UserId,
    },

    #[error("Environment {environment} has unsaved changes, save or discard them first")]
    UnsavedChanges { environment: String },

    #[error("Environment {environment} was saved by another session since it was loaded, discard or reload it first")]
    Stale { environment: String },

    #[error("{kind} {name} not found")]
    NotFound { kind: EntityKind, name: String },

    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: EntityKind, name: String },

    #[error("Clipboard holds a {found}, expected a {expected}")]
    WrongClipboardKind { expected: String, found: EntityKind },

    #[error("Clipboard is empty")]
    EmptyClipboard,

    #[error("Invalid {kind}: {reason}")]
    Invalid { kind: EntityKind, reason: String },

    #[error("Failed to read configuration: {0}")]
    StoreRead(String),

    #[error("Failed to write configuration: {0}")]
    StoreWrite(String),
}

impl ConsoleError {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        ConsoleError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn already_exists(kind: EntityKind, name: impl Into<String>) -> Self {
        ConsoleError::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(kind: EntityKind, reason: impl Into<String>) -> Self {
        ConsoleError::Invalid {
            kind,
            reason: reason.into(),
        }
    }

    /// Lock and permission failures, as opposed to validation failures.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            ConsoleError::PermissionDenied { .. }
                | ConsoleError::AdminRequired { .. }
                | ConsoleError::Locked { .. }
                | ConsoleError::NotOwner { .. }
        )
    }
}

/// Terminal failure of a remote agent operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Agent {agent_id} not found")]
    AgentNotFound { agent_id: String },

    #[error("Agent communication failed: {message}")]
    RpcFailure { message: String },

    #[error("Agent reported an error: {message}")]
    RemoteError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = ConsoleError::Locked {
            environment: "prod".to_string(),
            owner: UserId::from("alice"),
        };
        assert_eq!(err.to_string(), "Environment prod is locked by alice");

        let err = ConsoleError::already_exists(EntityKind::ConnectionPool, "ds1");
        assert_eq!(err.to_string(), "JDBC connection pool ds1 already exists");

        let err = OperationError::RemoteError {
            message: "not up to date".to_string(),
        };
        assert_eq!(err.to_string(), "Agent reported an error: not up to date");
    }

    #[test]
    fn access_denied_classification() {
        assert!(ConsoleError::PermissionDenied {
            user: UserId::from("bob"),
            capability: Capability::EditApplications,
        }
        .is_access_denied());
        assert!(!ConsoleError::EmptyClipboard.is_access_denied());
    }
}
