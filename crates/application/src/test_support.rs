use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use portalgate_core::{AppError, AppResult, BearerToken};
use portalgate_domain::{Permission, PortalAccess, PortalKey, Role, Session, SessionUser, UserId};
use tokio::sync::{Mutex, Notify};

use crate::{AuthGateway, CredentialStore, LoginCredentials, LoginGrant};

pub(crate) fn employee_session() -> Session {
    Session::new(
        SessionUser::new(UserId::new("u-employee"), "Erin Employee", Role::Employee)
            .with_email("erin@example.com")
            .with_permissions([Permission::EmployeePortal]),
        PortalAccess::none().with(PortalKey::Employee),
    )
}

pub(crate) fn admin_session() -> Session {
    Session::new(
        SessionUser::new(UserId::new("u-admin"), "Ada Admin", Role::Admin),
        PortalAccess::none().with_all_portals(),
    )
}

pub(crate) fn token(value: &str) -> BearerToken {
    BearerToken::new(value).unwrap_or_else(|_| panic!("test token must be valid"))
}

#[derive(Default)]
pub(crate) struct FakeAuthGateway {
    pub(crate) session: Mutex<Option<Session>>,
    pub(crate) network_down: Mutex<bool>,
    pub(crate) login_result: Mutex<Option<Result<LoginGrant, String>>>,
    pub(crate) logout_fails: Mutex<bool>,
    pub(crate) portal_grants: Mutex<HashMap<PortalKey, bool>>,
    pub(crate) fetch_calls: Mutex<usize>,
    pub(crate) check_calls: Mutex<Vec<PortalKey>>,
    pub(crate) logout_calls: Mutex<usize>,
    pub(crate) seen_tokens: Mutex<Vec<Option<String>>>,
    pub(crate) fetch_started: Notify,
    pub(crate) hold_fetch: Mutex<Option<Arc<Notify>>>,
}

impl FakeAuthGateway {
    pub(crate) async fn signed_in_as(session: Session) -> Arc<Self> {
        let gateway = Arc::new(Self::default());
        *gateway.session.lock().await = Some(session);
        gateway
    }

    pub(crate) async fn grant(&self, portal: PortalKey, has_access: bool) {
        self.portal_grants.lock().await.insert(portal, has_access);
    }

    pub(crate) async fn fetch_count(&self) -> usize {
        *self.fetch_calls.lock().await
    }

    async fn record_token(&self, token: Option<&BearerToken>) {
        self.seen_tokens
            .lock()
            .await
            .push(token.map(|value| value.expose().to_owned()));
    }

    async fn ensure_network(&self) -> AppResult<()> {
        if *self.network_down.lock().await {
            return Err(AppError::NetworkUnavailable(
                "connection refused".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthGateway for FakeAuthGateway {
    async fn fetch_session(&self, token: Option<&BearerToken>) -> AppResult<Option<Session>> {
        *self.fetch_calls.lock().await += 1;
        self.record_token(token).await;
        self.fetch_started.notify_one();

        let hold = self.hold_fetch.lock().await.clone();
        if let Some(release) = hold {
            release.notified().await;
        }

        self.ensure_network().await?;
        Ok(self.session.lock().await.clone())
    }

    async fn login(&self, _credentials: &LoginCredentials) -> AppResult<LoginGrant> {
        self.ensure_network().await?;
        match self.login_result.lock().await.clone() {
            Some(Ok(grant)) => {
                *self.session.lock().await = Some(grant.session.clone());
                Ok(grant)
            }
            Some(Err(message)) => Err(AppError::Rejected(message)),
            None => Err(AppError::Rejected("Invalid credentials".to_owned())),
        }
    }

    async fn logout(&self, token: Option<&BearerToken>) -> AppResult<()> {
        *self.logout_calls.lock().await += 1;
        self.record_token(token).await;
        if *self.logout_fails.lock().await {
            return Err(AppError::Rejected("Logout failed".to_owned()));
        }
        *self.session.lock().await = None;
        Ok(())
    }

    async fn check_portal(
        &self,
        token: Option<&BearerToken>,
        portal: PortalKey,
    ) -> AppResult<bool> {
        self.check_calls.lock().await.push(portal);
        self.record_token(token).await;
        self.ensure_network().await?;
        Ok(self
            .portal_grants
            .lock()
            .await
            .get(&portal)
            .copied()
            .unwrap_or(false))
    }
}

#[derive(Default)]
pub(crate) struct FakeCredentialStore {
    pub(crate) token: Mutex<Option<BearerToken>>,
    pub(crate) fail_store: Mutex<bool>,
    pub(crate) store_started: Notify,
    pub(crate) hold_store: Mutex<Option<Arc<Notify>>>,
}

impl FakeCredentialStore {
    pub(crate) async fn holding(token: BearerToken) -> Arc<Self> {
        let store = Arc::new(Self::default());
        *store.token.lock().await = Some(token);
        store
    }
}

#[async_trait]
impl CredentialStore for FakeCredentialStore {
    async fn load(&self) -> AppResult<Option<BearerToken>> {
        Ok(self.token.lock().await.clone())
    }

    async fn store(&self, token: BearerToken) -> AppResult<()> {
        self.store_started.notify_one();

        let hold = self.hold_store.lock().await.clone();
        if let Some(release) = hold {
            release.notified().await;
        }

        if *self.fail_store.lock().await {
            return Err(AppError::Internal("credential store is read-only".to_owned()));
        }
        *self.token.lock().await = Some(token);
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}
