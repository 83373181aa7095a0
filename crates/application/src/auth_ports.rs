use async_trait::async_trait;
use portalgate_core::{AppError, AppResult, BearerToken, NonEmptyString};
use portalgate_domain::{PortalKey, Session};

/// Username/password pair submitted to the login endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: NonEmptyString,
    password: String,
}

impl LoginCredentials {
    /// Creates validated login credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> AppResult<Self> {
        let username = NonEmptyString::new(username.into().trim())
            .map_err(|_| AppError::Validation("username is required".to_owned()))?;
        let password = password.into();
        if password.is_empty() {
            return Err(AppError::Validation("password is required".to_owned()));
        }

        Ok(Self { username, password })
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LoginCredentials")
            .field("username", &self.username.as_str())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    /// Session established by the login.
    pub session: Session,
    /// Bearer token to persist, when the backend issues one.
    pub token: Option<BearerToken>,
}

/// Port for the remote auth backend.
///
/// Implementations map non-success responses of the read endpoints to
/// "anonymous"/"no access" values and reserve `Err` for transport failures.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Reads the current session. `Ok(None)` means anonymous.
    async fn fetch_session(&self, token: Option<&BearerToken>) -> AppResult<Option<Session>>;

    /// Submits credentials. Rejections carry the backend message in
    /// [`AppError::Rejected`].
    async fn login(&self, credentials: &LoginCredentials) -> AppResult<LoginGrant>;

    /// Ends the backend session.
    async fn logout(&self, token: Option<&BearerToken>) -> AppResult<()>;

    /// Asks the backend whether the caller may enter one portal.
    async fn check_portal(&self, token: Option<&BearerToken>, portal: PortalKey)
    -> AppResult<bool>;
}

/// Port for client-local bearer token persistence.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Loads the stored token, if any.
    async fn load(&self) -> AppResult<Option<BearerToken>>;

    /// Replaces the stored token.
    async fn store(&self, token: BearerToken) -> AppResult<()>;

    /// Removes the stored token. Clearing an empty store succeeds.
    async fn clear(&self) -> AppResult<()>;
}
