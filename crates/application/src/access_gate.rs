//! Guard state machine for one protected portal route.
//!
//! A gate starts in [`GateState::Verifying`] and settles on exactly one of
//! the terminal states per verification pass. Results are applied through
//! [`VerificationTicket`]s; a ticket issued before the portal changed or the
//! gate closed is discarded.

use portalgate_domain::AccessDecision;
use tracing::debug;

/// Routes a gate offers when it refuses to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRoutes {
    sign_in: String,
    landing: String,
}

impl GateRoutes {
    /// Creates gate routes.
    #[must_use]
    pub fn new(sign_in: impl Into<String>, landing: impl Into<String>) -> Self {
        Self {
            sign_in: sign_in.into(),
            landing: landing.into(),
        }
    }

    /// Route of the sign-in flow.
    #[must_use]
    pub fn sign_in(&self) -> &str {
        self.sign_in.as_str()
    }

    /// Default landing route for denied users.
    #[must_use]
    pub fn landing(&self) -> &str {
        self.landing.as_str()
    }
}

impl Default for GateRoutes {
    fn default() -> Self {
        Self::new("/login", "/")
    }
}

/// What the gate currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// A session fetch or access check is in flight.
    Verifying,
    /// No signed-in user; offer the sign-in flow.
    Unauthenticated {
        /// Sign-in route to offer.
        sign_in_route: String,
    },
    /// Signed in without access; offer the way back.
    Unauthorized {
        /// Landing route to offer.
        landing_route: String,
    },
    /// Render the protected content.
    Authorized,
}

impl GateState {
    /// Returns a stable label for logs and output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verifying => "verifying",
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Authorized => "authorized",
        }
    }
}

/// Result of one verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The session fetch resolved without a signed-in user.
    Unauthenticated,
    /// Signed in, but the portal check refused entry.
    Unauthorized,
    /// Signed in and the portal check allowed entry.
    Authorized,
}

/// Handle for one in-flight verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTicket {
    epoch: u64,
    portal_id: String,
}

impl VerificationTicket {
    /// Returns the portal this pass verifies.
    #[must_use]
    pub fn portal_id(&self) -> &str {
        self.portal_id.as_str()
    }
}

/// Access gate for one guarded region.
#[derive(Debug, Clone)]
pub struct AccessGate {
    portal_id: String,
    routes: GateRoutes,
    state: GateState,
    epoch: u64,
    closed: bool,
}

impl AccessGate {
    /// Creates a gate for a portal in the `Verifying` state.
    #[must_use]
    pub fn new(portal_id: impl Into<String>, routes: GateRoutes) -> Self {
        Self {
            portal_id: portal_id.into(),
            routes,
            state: GateState::Verifying,
            epoch: 0,
            closed: false,
        }
    }

    /// Returns the guarded portal identifier.
    #[must_use]
    pub fn portal_id(&self) -> &str {
        self.portal_id.as_str()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Returns the routes offered by the terminal states.
    #[must_use]
    pub fn routes(&self) -> &GateRoutes {
        &self.routes
    }

    /// Returns whether the gate was torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Maps the current state onto a gating decision.
    #[must_use]
    pub fn decision(&self) -> AccessDecision {
        match self.state {
            GateState::Verifying => AccessDecision::Pending,
            GateState::Authorized => AccessDecision::Granted,
            GateState::Unauthenticated { .. } | GateState::Unauthorized { .. } => {
                AccessDecision::Denied
            }
        }
    }

    /// Starts a verification pass, invalidating earlier tickets.
    ///
    /// Returns `None` once the gate is closed.
    pub fn begin(&mut self) -> Option<VerificationTicket> {
        if self.closed {
            return None;
        }

        self.epoch = self.epoch.wrapping_add(1);
        self.state = GateState::Verifying;
        Some(VerificationTicket {
            epoch: self.epoch,
            portal_id: self.portal_id.clone(),
        })
    }

    /// Points the gate at another portal and starts a fresh pass.
    pub fn retarget(&mut self, portal_id: impl Into<String>) -> Option<VerificationTicket> {
        self.portal_id = portal_id.into();
        self.begin()
    }

    /// Forces a fresh pass for the same portal.
    pub fn invalidate(&mut self) -> Option<VerificationTicket> {
        self.begin()
    }

    /// Applies the result of a pass. Returns `false` when the ticket is stale.
    pub fn complete(&mut self, ticket: VerificationTicket, outcome: GateOutcome) -> bool {
        if self.closed || ticket.epoch != self.epoch || ticket.portal_id != self.portal_id {
            debug!(
                portal = %ticket.portal_id,
                outcome = ?outcome,
                "discarding stale gate verification"
            );
            return false;
        }

        self.state = match outcome {
            GateOutcome::Unauthenticated => GateState::Unauthenticated {
                sign_in_route: self.routes.sign_in().to_owned(),
            },
            GateOutcome::Unauthorized => GateState::Unauthorized {
                landing_route: self.routes.landing().to_owned(),
            },
            GateOutcome::Authorized => GateState::Authorized,
        };
        true
    }

    /// Tears the gate down; outstanding tickets become stale.
    pub fn close(&mut self) {
        self.closed = true;
        self.epoch = self.epoch.wrapping_add(1);
    }
}
