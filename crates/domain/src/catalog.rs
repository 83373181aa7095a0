//! Portal listing for navigation menus and the dashboard grid.
//!
//! Listing works from the session's own role and permission set, so it never
//! needs a round-trip. Gating a route is a separate, remote decision.

use serde::{Deserialize, Serialize};

use crate::{Permission, PortalDescriptor, Role, Session};

/// Display-only marker attached to a listed portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalBadge {
    /// The viewer owns the company.
    Owner,
    /// The portal is the viewer's own area.
    SelfService,
}

impl PortalBadge {
    /// Returns the label shown next to the portal name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::SelfService => "Self-service",
        }
    }
}

/// A portal the viewer may see, with its optional badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisiblePortal {
    /// The listed portal.
    pub descriptor: PortalDescriptor,
    /// Badge shown next to the portal, if any.
    pub badge: Option<PortalBadge>,
}

/// Returns whether a session may see one portal in listings.
#[must_use]
pub fn can_list(descriptor: &PortalDescriptor, session: &Session) -> bool {
    let user = session.user();
    user.role().has_full_access()
        || user.has_permission(Permission::AllPortals)
        || user.has_permission(descriptor.required_permission())
}

/// Computes the badge for one portal. Badges never affect inclusion.
#[must_use]
pub fn portal_badge(descriptor: &PortalDescriptor, session: &Session) -> Option<PortalBadge> {
    let role = session.user().role();
    if matches!(role, Role::Owner) {
        return Some(PortalBadge::Owner);
    }

    (role.home_portal() == Some(descriptor.key())).then_some(PortalBadge::SelfService)
}

/// Filters descriptors down to those the session may see, keeping input order.
///
/// A missing or signed-out session sees nothing.
#[must_use]
pub fn visible_portals(
    descriptors: &[PortalDescriptor],
    session: Option<&Session>,
) -> Vec<VisiblePortal> {
    let Some(session) = session.filter(|session| session.is_authenticated()) else {
        return Vec::new();
    };

    descriptors
        .iter()
        .filter(|descriptor| can_list(descriptor, session))
        .map(|descriptor| VisiblePortal {
            descriptor: descriptor.clone(),
            badge: portal_badge(descriptor, session),
        })
        .collect()
}
