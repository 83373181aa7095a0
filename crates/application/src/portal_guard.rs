use std::sync::Arc;

use portalgate_domain::AccessDecision;

use crate::{
    AccessGate, GateRoutes, GateState, PortalAccessService, SessionSnapshot, VerificationTicket,
};

/// Drives one [`AccessGate`] against a [`PortalAccessService`].
///
/// A settled state is only reported while the session it was verified
/// against is still current. After a login, logout or refresh the guard
/// reports `Verifying` (or `Unauthenticated` once the session is known to be
/// anonymous) until the next pass.
pub struct PortalGuard {
    access: Arc<PortalAccessService>,
    gate: AccessGate,
    verified_generation: u64,
}

impl PortalGuard {
    /// Creates a guard for a portal. Nothing is verified until
    /// [`PortalGuard::verify`] runs.
    #[must_use]
    pub fn new(
        access: Arc<PortalAccessService>,
        portal_id: impl Into<String>,
        routes: GateRoutes,
    ) -> Self {
        let verified_generation = access.sessions().generation();
        Self {
            access,
            gate: AccessGate::new(portal_id, routes),
            verified_generation,
        }
    }

    /// Returns the gate state as of the current session.
    #[must_use]
    pub fn state(&self) -> GateState {
        let state = self.gate.state();
        if matches!(state, GateState::Verifying)
            || self.access.sessions().generation() == self.verified_generation
        {
            return state.clone();
        }

        match self.access.sessions().snapshot() {
            SessionSnapshot::Anonymous => GateState::Unauthenticated {
                sign_in_route: self.gate.routes().sign_in().to_owned(),
            },
            SessionSnapshot::Loading | SessionSnapshot::Authenticated(_) => GateState::Verifying,
        }
    }

    /// Returns the gating decision for the current state.
    #[must_use]
    pub fn decision(&self) -> AccessDecision {
        match self.state() {
            GateState::Verifying => AccessDecision::Pending,
            GateState::Authorized => AccessDecision::Granted,
            GateState::Unauthenticated { .. } | GateState::Unauthorized { .. } => {
                AccessDecision::Denied
            }
        }
    }

    /// Returns the underlying gate.
    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Runs a full verification pass for the current portal.
    pub async fn verify(&mut self) -> GateState {
        let ticket = self.gate.begin();
        self.run(ticket).await
    }

    /// Switches to another portal and verifies it from scratch.
    pub async fn navigate(&mut self, portal_id: impl Into<String>) -> GateState {
        let ticket = self.gate.retarget(portal_id);
        self.run(ticket).await
    }

    /// Re-verifies the current portal, for example after sign-in changes.
    pub async fn revalidate(&mut self) -> GateState {
        self.verify().await
    }

    /// Tears the guard down.
    pub fn close(&mut self) {
        self.gate.close();
    }

    async fn run(&mut self, ticket: Option<VerificationTicket>) -> GateState {
        let Some(ticket) = ticket else {
            return self.state();
        };

        let generation = self.access.sessions().generation();
        let outcome = self.access.decide(ticket.portal_id()).await;
        if self.gate.complete(ticket, outcome) {
            self.verified_generation = generation;
        }
        self.state()
    }
}
