use std::time::Duration;

use async_trait::async_trait;
use portalgate_application::{AuthGateway, LoginCredentials, LoginGrant};
use portalgate_core::{AppError, AppResult, BearerToken};
use portalgate_domain::{PortalKey, Session};
use reqwest::header;
use tracing::debug;
use url::Url;

mod dto;

use dto::{
    ErrorResponse, LoginRequest, LoginResponse, PortalCheckResponse, SessionResponse,
};

/// HTTP adapter for the portal auth backend.
pub struct HttpAuthGateway {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpAuthGateway {
    /// Creates a gateway for a backend rooted at `base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(path.as_str());
        }

        Self {
            http_client,
            base_url,
        }
    }

    /// Builds the HTTP client used against the backend.
    ///
    /// Cookies are kept so a cookie session works when no bearer token is
    /// stored.
    pub fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))
    }

    /// Returns the backend root.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("invalid auth endpoint '{path}': {error}"))
        })
    }

    fn authorize(
        builder: reqwest::RequestBuilder,
        token: Option<&BearerToken>,
    ) -> reqwest::RequestBuilder {
        match token {
            Some(token) => builder.header(header::AUTHORIZATION, token.authorization_header()),
            None => builder,
        }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn fetch_session(&self, token: Option<&BearerToken>) -> AppResult<Option<Session>> {
        let endpoint = self.endpoint("api/auth/me")?;
        let response = Self::authorize(self.http_client.get(endpoint), token)
            .send()
            .await
            .map_err(|error| transport_error("session", &error))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "session endpoint reported no session");
            return Ok(None);
        }

        let body = response.json::<SessionResponse>().await.map_err(|error| {
            AppError::Internal(format!("failed to parse session response body: {error}"))
        })?;

        Ok(body
            .user
            .map(|user| Session::new(user.into_session_user(), body.portals)))
    }

    async fn login(&self, credentials: &LoginCredentials) -> AppResult<LoginGrant> {
        let endpoint = self.endpoint("api/auth/login")?;
        let response = self
            .http_client
            .post(endpoint)
            .json(&LoginRequest {
                username: credentials.username(),
                password: credentials.password(),
            })
            .send()
            .await
            .map_err(|error| transport_error("login", &error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Rejected(
                rejection_message(response, "Sign-in failed").await,
            ));
        }

        let body = response.json::<LoginResponse>().await.map_err(|error| {
            AppError::Internal(format!("failed to parse login response body: {error}"))
        })?;

        let token = body
            .token
            .filter(|value| !value.trim().is_empty())
            .map(BearerToken::new)
            .transpose()?;

        Ok(LoginGrant {
            session: Session::new(body.user.into_session_user(), body.portals),
            token,
        })
    }

    async fn logout(&self, token: Option<&BearerToken>) -> AppResult<()> {
        let endpoint = self.endpoint("api/auth/logout")?;
        let response = Self::authorize(self.http_client.post(endpoint), token)
            .send()
            .await
            .map_err(|error| transport_error("logout", &error))?;

        if !response.status().is_success() {
            return Err(AppError::Rejected(
                rejection_message(response, "Sign-out failed").await,
            ));
        }

        Ok(())
    }

    async fn check_portal(
        &self,
        token: Option<&BearerToken>,
        portal: PortalKey,
    ) -> AppResult<bool> {
        let endpoint = self.endpoint(format!("api/auth/portal/{}", portal.as_str()).as_str())?;
        let response = Self::authorize(self.http_client.get(endpoint), token)
            .send()
            .await
            .map_err(|error| transport_error("portal access", &error))?;

        let status = response.status();
        if !status.is_success() {
            debug!(
                portal = %portal,
                status = status.as_u16(),
                "portal endpoint refused access"
            );
            return Ok(false);
        }

        let body = response
            .json::<PortalCheckResponse>()
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to parse portal access response body: {error}"
                ))
            })?;

        Ok(body.has_access)
    }
}

fn transport_error(operation: &str, error: &reqwest::Error) -> AppError {
    AppError::NetworkUnavailable(format!("failed to call {operation} endpoint: {error}"))
}

async fn rejection_message(response: reqwest::Response, fallback: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body.as_str())
        && let Some(message) = parsed.into_message()
    {
        return message;
    }

    let body = body.trim();
    if body.is_empty() {
        format!("{fallback} (status {})", status.as_u16())
    } else {
        body.to_owned()
    }
}
