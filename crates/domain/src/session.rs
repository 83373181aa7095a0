use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Permission, PortalAccess, Role};

/// Identifier of a user account on the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user identifier from the backend value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Signed-in user as described by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    id: UserId,
    display_name: String,
    email: Option<String>,
    role: Role,
    permissions: BTreeSet<Permission>,
    active: bool,
}

impl SessionUser {
    /// Creates an active user with no permissions.
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: None,
            role,
            permissions: BTreeSet::new(),
            active: true,
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Replaces the permission set.
    #[must_use]
    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns the user identifier.
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the backend returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the role.
    #[must_use]
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Returns the permission set.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    /// Returns whether the permission set contains one permission.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Returns whether the account is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Snapshot of the authenticated session.
///
/// Replaced wholesale on every fetch; consumers hold it behind an `Arc` and
/// never mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: SessionUser,
    portals: PortalAccess,
    fetched_at: DateTime<Utc>,
}

impl Session {
    /// Creates an authenticated session fetched now.
    #[must_use]
    pub fn new(user: SessionUser, portals: PortalAccess) -> Self {
        Self {
            user,
            portals,
            fetched_at: Utc::now(),
        }
    }

    /// Overrides the fetch timestamp.
    #[must_use]
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    /// Returns the signed-in user.
    #[must_use]
    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    /// Returns the portal access flags.
    #[must_use]
    pub fn portals(&self) -> &PortalAccess {
        &self.portals
    }

    /// Returns whether this session represents a usable sign-in.
    ///
    /// Anonymous callers have no `Session` at all, so this only fails for a
    /// deactivated account, which is treated as signed out.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_active()
    }

    /// Returns when the backend produced this snapshot.
    #[must_use]
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}
