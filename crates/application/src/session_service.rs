use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use portalgate_core::{AppError, AppResult, BearerToken};
use portalgate_domain::Session;
use tokio::sync::{RwLock, broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{AuthGateway, CredentialStore, LoginCredentials};

/// How long a fetched session is reused before the backend is asked again.
pub const DEFAULT_SESSION_FRESHNESS: Duration = Duration::from_secs(300);

const NOTICE_CAPACITY: usize = 16;

/// Non-blocking view of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSnapshot {
    /// Nothing has resolved since the last invalidation.
    Loading,
    /// The backend reported no usable session.
    Anonymous,
    /// A signed-in session.
    Authenticated(Arc<Session>),
}

impl SessionSnapshot {
    /// Returns the session when signed in.
    #[must_use]
    pub fn session(&self) -> Option<&Arc<Session>> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Loading | Self::Anonymous => None,
        }
    }

    /// Returns whether the state is still unresolved.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    fn from_session(session: Option<&Arc<Session>>) -> Self {
        session
            .cloned()
            .map(Self::Authenticated)
            .unwrap_or(Self::Anonymous)
    }
}

/// Transient user-facing notification about sign-in state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// Sign-in succeeded.
    LoggedIn {
        /// Display name of the signed-in user.
        display_name: String,
    },
    /// Sign-out completed.
    LoggedOut,
    /// Sign-in failed with this message.
    LoginFailed(String),
    /// The backend sign-out call failed with this message; the client is
    /// signed out regardless.
    LogoutFailed(String),
}

#[derive(Debug, Clone)]
struct CachedSession {
    session: Option<Arc<Session>>,
    fetched_at: Instant,
}

/// Owns the client's session cache and the stored credential.
///
/// Every login, logout and forced refresh bumps a generation counter; a fetch
/// that started under an older generation never writes the cache.
pub struct SessionService {
    gateway: Arc<dyn AuthGateway>,
    credentials: Arc<dyn CredentialStore>,
    freshness: Duration,
    cache: RwLock<Option<CachedSession>>,
    generation: AtomicU64,
    sign_outs: AtomicU64,
    snapshot: watch::Sender<SessionSnapshot>,
    notices: broadcast::Sender<SessionNotice>,
}

impl SessionService {
    /// Creates a session service with the default freshness window.
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthGateway>, credentials: Arc<dyn CredentialStore>) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::Loading);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            gateway,
            credentials,
            freshness: DEFAULT_SESSION_FRESHNESS,
            cache: RwLock::new(None),
            generation: AtomicU64::new(0),
            sign_outs: AtomicU64::new(0),
            snapshot,
            notices,
        }
    }

    /// Overrides the freshness window.
    #[must_use]
    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    /// Returns the freshness window.
    #[must_use]
    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Returns the current session, fetching it when the cache is stale.
    pub async fn session(&self) -> Option<Arc<Session>> {
        if let Some(cached) = self.fresh_cached().await {
            debug!(authenticated = cached.is_some(), "session cache hit");
            return cached;
        }

        debug!("session cache miss");
        self.fetch().await
    }

    /// Drops the cache and fetches the session again.
    pub async fn refresh(&self) -> Option<Arc<Session>> {
        self.invalidate().await;
        self.fetch().await
    }

    /// Drops the cache without fetching. Dependent reads after this call see
    /// [`SessionSnapshot::Loading`] until the next fetch resolves.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *cache = None;
        self.snapshot.send_replace(SessionSnapshot::Loading);
    }

    /// Returns the current state without waiting on the backend.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribes to session state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Subscribes to transient sign-in notifications.
    #[must_use]
    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    /// Returns the stored bearer token, if any.
    pub async fn bearer_token(&self) -> Option<BearerToken> {
        match self.credentials.load().await {
            Ok(token) => token,
            Err(error) => {
                warn!(error = %error, "failed to load stored credential");
                None
            }
        }
    }

    /// Signs in and replaces the cached session.
    ///
    /// A rejected sign-in leaves the cached session untouched. A sign-in that
    /// a [`SessionService::logout`] overtakes is abandoned and its token is
    /// discarded.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Arc<Session>> {
        let credentials = LoginCredentials::new(username, password)?;
        let sign_outs = self.sign_outs.load(Ordering::SeqCst);

        let grant = match self.gateway.login(&credentials).await {
            Ok(grant) => grant,
            Err(error) => {
                warn!(username = credentials.username(), error = %error, "sign-in failed");
                return Err(self.login_failed(error));
            }
        };

        if !grant.session.is_authenticated() {
            return Err(self.login_failed(AppError::Unauthenticated(
                "account is not active".to_owned(),
            )));
        }

        if let Some(token) = &grant.token
            && let Err(error) = self.credentials.store(token.clone()).await
        {
            warn!(error = %error, "failed to store credential after sign-in");
            return Err(self.login_failed(error));
        }

        let session = Arc::new(grant.session);
        if !self.commit_sign_in(sign_outs, session.clone()).await {
            if let Some(token) = &grant.token {
                self.discard_token(token).await;
            }
            warn!(user_id = %session.user().id(), "sign-in overtaken by sign-out");
            return Err(self.login_failed(AppError::Unauthenticated(
                "sign-in was cancelled by a sign-out".to_owned(),
            )));
        }

        info!(user_id = %session.user().id(), role = %session.user().role(), "signed in");
        self.notify(SessionNotice::LoggedIn {
            display_name: session.user().display_name().to_owned(),
        });

        Ok(session)
    }

    /// Signs out.
    ///
    /// The cache and the stored credential are cleared before the backend is
    /// called, so the client is signed out even when the call fails.
    pub async fn logout(&self) -> AppResult<()> {
        let token = self.bearer_token().await;

        self.sign_out_locally().await;
        let cleared = self.credentials.clear().await;

        if let Err(error) = self.gateway.logout(token.as_ref()).await {
            warn!(error = %error, "backend sign-out failed; client state cleared");
            self.notify(SessionNotice::LogoutFailed(notice_message(&error)));
            return Err(error);
        }

        if let Err(error) = cleared {
            warn!(error = %error, "failed to clear stored credential");
            return Err(error);
        }

        info!("signed out");
        self.notify(SessionNotice::LoggedOut);
        Ok(())
    }

    /// Returns the invalidation generation.
    ///
    /// It changes on every login, logout, refresh and explicit invalidation,
    /// so anything derived from the session can tell it has gone stale.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    async fn commit_sign_in(&self, sign_outs: u64, session: Arc<Session>) -> bool {
        let mut cache = self.cache.write().await;
        if self.sign_outs.load(Ordering::SeqCst) != sign_outs {
            return false;
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .send_replace(SessionSnapshot::Authenticated(session.clone()));
        *cache = Some(CachedSession {
            session: Some(session),
            fetched_at: Instant::now(),
        });
        true
    }

    async fn sign_out_locally(&self) {
        let mut cache = self.cache.write().await;
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.snapshot.send_replace(SessionSnapshot::Anonymous);
        *cache = Some(CachedSession {
            session: None,
            fetched_at: Instant::now(),
        });
    }

    async fn discard_token(&self, token: &BearerToken) {
        match self.credentials.load().await {
            Ok(Some(stored)) if stored == *token => {
                if let Err(error) = self.credentials.clear().await {
                    warn!(error = %error, "failed to discard credential of cancelled sign-in");
                }
            }
            Ok(_) => {}
            Err(error) => warn!(error = %error, "failed to load stored credential"),
        }
    }

    fn login_failed(&self, error: AppError) -> AppError {
        self.notify(SessionNotice::LoginFailed(notice_message(&error)));
        error
    }

    async fn fresh_cached(&self) -> Option<Option<Arc<Session>>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.freshness)
            .map(|entry| entry.session.clone())
    }

    async fn fetch(&self) -> Option<Arc<Session>> {
        let generation = self.generation.load(Ordering::SeqCst);
        let token = self.bearer_token().await;

        match self.gateway.fetch_session(token.as_ref()).await {
            Ok(session) => {
                let session = session
                    .filter(Session::is_authenticated)
                    .map(Arc::new);
                if self.store_if_current(generation, session.clone()).await {
                    return session;
                }

                debug!("discarding session fetched before an invalidation");
                self.current_cached().await
            }
            Err(error) => {
                warn!(error = %error, "session fetch failed; treating caller as anonymous");
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.snapshot.send_replace(SessionSnapshot::Anonymous);
                }
                None
            }
        }
    }

    async fn current_cached(&self) -> Option<Arc<Session>> {
        self.cache
            .read()
            .await
            .as_ref()
            .and_then(|entry| entry.session.clone())
    }

    async fn store_if_current(&self, generation: u64, session: Option<Arc<Session>>) -> bool {
        let mut cache = self.cache.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }

        self.snapshot
            .send_replace(SessionSnapshot::from_session(session.as_ref()));
        *cache = Some(CachedSession {
            session,
            fetched_at: Instant::now(),
        });
        true
    }

    fn notify(&self, notice: SessionNotice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }
}

fn notice_message(error: &AppError) -> String {
    match error {
        AppError::Rejected(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests;
