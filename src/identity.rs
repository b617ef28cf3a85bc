//! Identity and capability model
//!
//! The console never authenticates anyone itself. An external provider hands
//! the session an [`Identity`]; every mutating or provisioning action checks
//! one [`Capability`] against it before touching the configuration tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ConsoleError;

/// Identifier of a console user, also used as the lock owner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Fine-grained permissions granted to non-administrator users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    EditEnvironment,
    UpdateEnvironment,
    EditApplicationServers,
    UpdateApplicationServers,
    EditApplications,
    UpdateApplications,
    EditResources,
    UpdateResources,
    EditNotifiers,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::EditEnvironment,
        Capability::UpdateEnvironment,
        Capability::EditApplicationServers,
        Capability::UpdateApplicationServers,
        Capability::EditApplications,
        Capability::UpdateApplications,
        Capability::EditResources,
        Capability::UpdateResources,
        Capability::EditNotifiers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::EditEnvironment => "edit-environment",
            Capability::UpdateEnvironment => "update-environment",
            Capability::EditApplicationServers => "edit-application-servers",
            Capability::UpdateApplicationServers => "update-application-servers",
            Capability::EditApplications => "edit-applications",
            Capability::UpdateApplications => "update-applications",
            Capability::EditResources => "edit-resources",
            Capability::UpdateResources => "update-resources",
            Capability::EditNotifiers => "edit-notifiers",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .copied()
            .find(|capability| capability.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Capability::ALL.iter().map(Capability::as_str).collect();
                format!("unknown capability '{s}', expected one of: {}", known.join(", "))
            })
    }
}

/// The logged-in user as seen by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    admin: bool,
    capabilities: BTreeSet<Capability>,
}

impl Identity {
    pub fn user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            admin: false,
            capabilities: BTreeSet::new(),
        }
    }

    pub fn admin(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            admin: true,
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn with_capabilities<I>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = Capability>,
    {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Administrators implicitly hold every capability.
    pub fn can(&self, capability: Capability) -> bool {
        self.admin || self.capabilities.contains(&capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), ConsoleError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(ConsoleError::PermissionDenied {
                user: self.user_id.clone(),
                capability,
            })
        }
    }

    pub fn require_admin(&self, action: &str) -> Result<(), ConsoleError> {
        if self.admin {
            Ok(())
        } else {
            Err(ConsoleError::AdminRequired {
                user: self.user_id.clone(),
                action: action.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_capability() {
        let admin = Identity::admin("root");
        assert!(Capability::ALL.iter().all(|c| admin.can(*c)));
    }

    #[test]
    fn user_only_holds_granted_capabilities() {
        let user = Identity::user("bob").with_capability(Capability::EditApplications);
        assert!(user.can(Capability::EditApplications));
        assert!(!user.can(Capability::UpdateApplications));

        let err = user.require(Capability::UpdateApplications).unwrap_err();
        assert!(matches!(err, ConsoleError::PermissionDenied { .. }));
    }

    #[test]
    fn capability_parses_from_kebab_case() {
        assert_eq!(
            "update-resources".parse::<Capability>().unwrap(),
            Capability::UpdateResources
        );
        assert!("fly".parse::<Capability>().is_err());
    }
}
