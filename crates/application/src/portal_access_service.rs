use std::sync::Arc;

use portalgate_domain::{
    AccessCheck, PortalCatalog, PortalKey, VisiblePortal, visible_portals,
};
use tracing::{debug, warn};

use crate::{AuthGateway, GateOutcome, SessionService};

/// Resolves portal access for the current session.
///
/// Two signals exist. The backend's per-portal check decides gating. The
/// session's own flags and permissions decide listing, so menus render
/// without a round-trip. They can disagree while the session cache is stale.
#[derive(Clone)]
pub struct PortalAccessService {
    sessions: Arc<SessionService>,
    gateway: Arc<dyn AuthGateway>,
    catalog: Arc<PortalCatalog>,
}

impl PortalAccessService {
    /// Creates a resolver over a session service and portal catalog.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionService>,
        gateway: Arc<dyn AuthGateway>,
        catalog: Arc<PortalCatalog>,
    ) -> Self {
        Self {
            sessions,
            gateway,
            catalog,
        }
    }

    /// Returns the session service this resolver reads from.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionService> {
        &self.sessions
    }

    /// Returns the portal catalog.
    #[must_use]
    pub fn catalog(&self) -> &PortalCatalog {
        self.catalog.as_ref()
    }

    /// Checks whether the current session may enter a portal.
    ///
    /// Unknown portals and anonymous callers resolve to no access without
    /// contacting the per-portal endpoint.
    pub async fn check_access(&self, portal_id: &str) -> AccessCheck {
        let Some(key) = self.catalog.find(portal_id).map(|descriptor| descriptor.key()) else {
            debug!(portal = portal_id, "access check for unknown portal");
            return AccessCheck::denied();
        };

        if self.sessions.session().await.is_none() {
            return AccessCheck::denied();
        }

        AccessCheck::from(self.remote_check(key).await)
    }

    /// Runs one gate verification: session first, then the portal check.
    pub async fn decide(&self, portal_id: &str) -> GateOutcome {
        if self.sessions.session().await.is_none() {
            return GateOutcome::Unauthenticated;
        }

        let Some(key) = self.catalog.find(portal_id).map(|descriptor| descriptor.key()) else {
            debug!(portal = portal_id, "gate for unknown portal");
            return GateOutcome::Unauthorized;
        };

        if self.remote_check(key).await {
            GateOutcome::Authorized
        } else {
            GateOutcome::Unauthorized
        }
    }

    /// Returns whether the session's access flags allow a portal.
    pub async fn has_local_access(&self, key: PortalKey) -> bool {
        self.sessions
            .session()
            .await
            .is_some_and(|session| session.portals().allows(key))
    }

    /// Returns the catalog portals the session may see, in catalog order.
    pub async fn visible_portals(&self) -> Vec<VisiblePortal> {
        let session = self.sessions.session().await;
        visible_portals(self.catalog.descriptors(), session.as_deref())
    }

    async fn remote_check(&self, key: PortalKey) -> bool {
        let token = self.sessions.bearer_token().await;
        match self.gateway.check_portal(token.as_ref(), key).await {
            Ok(has_access) => {
                debug!(portal = %key, has_access, "portal access resolved");
                has_access
            }
            Err(error) => {
                warn!(portal = %key, error = %error, "portal access check failed; denying");
                false
            }
        }
    }
}
