//! Single-writer lock per environment
//!
//! The lock is a field on [`Environment`]. There is no separate acquire step
//! in the edit flow: every mutating action first calls
//! [`LockManager::check_mutation`] and, once its change succeeded,
//! [`LockManager::claim`], so the first successful edit of an unlocked
//! environment makes the editing user its owner.
//!
//! Administrators bypass the lock only for administrative operations
//! (deleting an environment, releasing or reassigning a lock). Ordinary edits
//! honour the lock for everyone.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConsoleError;
use crate::identity::{Identity, UserId};
use crate::model::Environment;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<UserId>", into = "Option<UserId>")]
pub enum LockState {
    #[default]
    Unlocked,
    LockedBy(UserId),
}

impl LockState {
    pub fn owner(&self) -> Option<&UserId> {
        match self {
            LockState::Unlocked => None,
            LockState::LockedBy(owner) => Some(owner),
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::LockedBy(_))
    }

    pub fn is_held_by(&self, user: &UserId) -> bool {
        self.owner() == Some(user)
    }
}

impl From<Option<UserId>> for LockState {
    fn from(owner: Option<UserId>) -> Self {
        match owner {
            // Older documents stored the empty string for "unlocked".
            Some(owner) if !owner.as_str().is_empty() => LockState::LockedBy(owner),
            _ => LockState::Unlocked,
        }
    }
}

impl From<LockState> for Option<UserId> {
    fn from(state: LockState) -> Self {
        match state {
            LockState::Unlocked => None,
            LockState::LockedBy(owner) => Some(owner),
        }
    }
}

/// Grants and revokes environment locks.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockManager;

impl LockManager {
    /// Takes the lock for `identity`. Re-acquiring an owned lock succeeds.
    pub fn acquire(environment: &mut Environment, identity: &Identity) -> Result<(), ConsoleError> {
        Self::check_mutation(environment, identity)?;
        if !environment.lock.is_locked() {
            environment.lock = LockState::LockedBy(identity.user_id().clone());
            info!(
                environment = %environment.name,
                user = %identity.user_id(),
                "Environment locked"
            );
        }
        Ok(())
    }

    /// Releases the lock. Only the owner or an administrator may do so;
    /// releasing an unlocked environment is a no-op.
    pub fn release(environment: &mut Environment, identity: &Identity) -> Result<(), ConsoleError> {
        match &environment.lock {
            LockState::Unlocked => Ok(()),
            LockState::LockedBy(owner) if owner == identity.user_id() || identity.is_admin() => {
                info!(
                    environment = %environment.name,
                    owner = %owner,
                    user = %identity.user_id(),
                    "Environment unlocked"
                );
                environment.lock = LockState::Unlocked;
                Ok(())
            }
            LockState::LockedBy(owner) => {
                warn!(
                    environment = %environment.name,
                    owner = %owner,
                    user = %identity.user_id(),
                    "Refusing to release a lock held by another user"
                );
                Err(ConsoleError::NotOwner {
                    environment: environment.name.clone(),
                    owner: owner.clone(),
                    user: identity.user_id().clone(),
                })
            }
        }
    }

    /// Succeeds iff the environment is unlocked or locked by `identity`.
    pub fn check_mutation(environment: &Environment, identity: &Identity) -> Result<(), ConsoleError> {
        match &environment.lock {
            LockState::LockedBy(owner) if owner != identity.user_id() => {
                warn!(
                    environment = %environment.name,
                    owner = %owner,
                    user = %identity.user_id(),
                    "Environment is locked by another user"
                );
                Err(ConsoleError::Locked {
                    environment: environment.name.clone(),
                    owner: owner.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Implicit acquire performed by the first successful mutation.
    pub fn claim(environment: &mut Environment, identity: &Identity) {
        if !environment.lock.is_locked() {
            environment.lock = LockState::LockedBy(identity.user_id().clone());
        }
    }

    /// Administrator override: hand the lock to `new_owner`, or clear it.
    pub fn reassign(
        environment: &mut Environment,
        identity: &Identity,
        new_owner: Option<UserId>,
    ) -> Result<(), ConsoleError> {
        if !identity.is_admin() {
            return match environment.lock.owner() {
                Some(owner) => Err(ConsoleError::NotOwner {
                    environment: environment.name.clone(),
                    owner: owner.clone(),
                    user: identity.user_id().clone(),
                }),
                None => Err(ConsoleError::AdminRequired {
                    user: identity.user_id().clone(),
                    action: "reassign locks".to_string(),
                }),
            };
        }
        info!(
            environment = %environment.name,
            previous = ?environment.lock.owner(),
            next = ?new_owner,
            admin = %identity.user_id(),
            "Environment lock reassigned"
        );
        environment.lock = new_owner.into();
        Ok(())
    }
}
