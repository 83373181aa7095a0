//! Application services and ports for portal sessions and access gating.

#![forbid(unsafe_code)]

mod access_gate;
mod auth_ports;
mod portal_access_service;
mod portal_guard;
mod session_service;

#[cfg(test)]
mod test_support;

pub use access_gate::{AccessGate, GateOutcome, GateRoutes, GateState, VerificationTicket};
pub use auth_ports::{AuthGateway, CredentialStore, LoginCredentials, LoginGrant};
pub use portal_access_service::PortalAccessService;
pub use portal_guard::PortalGuard;
pub use session_service::{
    DEFAULT_SESSION_FRESHNESS, SessionNotice, SessionService, SessionSnapshot,
};
