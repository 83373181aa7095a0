//! Domain entities and invariants for portal access.

#![forbid(unsafe_code)]

mod access;
mod catalog;
mod portal;
mod security;
mod session;

pub use access::{AccessCheck, AccessDecision};
pub use catalog::{PortalBadge, VisiblePortal, can_list, portal_badge, visible_portals};
pub use portal::{PortalAccess, PortalCatalog, PortalDescriptor, PortalKey};
pub use security::{Permission, Role};
pub use session::{Session, SessionUser, UserId};
