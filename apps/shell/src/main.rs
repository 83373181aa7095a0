//! Portalgate command-line shell.
//!
//! Usage: `portalgate-shell <status|login|logout|check <portal>|portals>`.

#![forbid(unsafe_code)]

mod shell_config;

use std::env;
use std::sync::Arc;

use portalgate_application::{
    CredentialStore, GateRoutes, GateState, PortalAccessService, PortalGuard, SessionNotice,
    SessionService,
};
use portalgate_core::{AppError, AppResult};
use portalgate_domain::PortalCatalog;
use portalgate_infrastructure::{FileCredentialStore, HttpAuthGateway, InMemoryCredentialStore};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::shell_config::{ShellConfig, init_tracing, required_env};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Status,
    Login,
    Logout,
    Check(String),
    Portals,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> AppResult<Self> {
        let command = args.next().unwrap_or_else(|| "status".to_owned());
        match command.as_str() {
            "status" => Ok(Self::Status),
            "login" => Ok(Self::Login),
            "logout" => Ok(Self::Logout),
            "portals" => Ok(Self::Portals),
            "check" => args.next().map(Self::Check).ok_or_else(|| {
                AppError::Validation("usage: portalgate-shell check <portal>".to_owned())
            }),
            other => Err(AppError::Validation(format!(
                "unknown command '{other}', expected status, login, logout, check or portals"
            ))),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = Command::parse(env::args().skip(1))?;
    let config = ShellConfig::load()?;
    let access = build_access_service(&config)?;

    info!(
        api_base_url = %config.api_base_url,
        session_ttl_seconds = config.session_ttl.as_secs(),
        "portalgate-shell started"
    );

    let output = match command {
        Command::Status => status(&access).await,
        Command::Login => login(&access, &config).await?,
        Command::Logout => logout(&access).await?,
        Command::Check(portal_id) => check(access, &config, portal_id).await,
        Command::Portals => portals(&access).await,
    };

    println!("{output:#}");
    Ok(())
}

fn build_access_service(config: &ShellConfig) -> AppResult<Arc<PortalAccessService>> {
    let http_client = HttpAuthGateway::build_client(config.http_timeout)?;
    let gateway = Arc::new(HttpAuthGateway::new(
        http_client,
        config.api_base_url.clone(),
    ));
    let credentials: Arc<dyn CredentialStore> = match &config.credential_file {
        Some(path) => Arc::new(FileCredentialStore::new(path.clone())),
        None => Arc::new(InMemoryCredentialStore::new()),
    };

    let sessions = Arc::new(
        SessionService::new(gateway.clone(), credentials).with_freshness(config.session_ttl),
    );

    Ok(Arc::new(PortalAccessService::new(
        sessions,
        gateway,
        Arc::new(PortalCatalog::standard()),
    )))
}

async fn status(access: &PortalAccessService) -> Value {
    match access.sessions().session().await {
        Some(session) => json!({
            "authenticated": true,
            "user": {
                "id": session.user().id().as_str(),
                "name": session.user().display_name(),
                "email": session.user().email(),
                "role": session.user().role().as_str(),
            },
            "portals": session.portals(),
            "fetchedAt": session.fetched_at().to_rfc3339(),
        }),
        None => json!({ "authenticated": false }),
    }
}

async fn login(access: &PortalAccessService, config: &ShellConfig) -> AppResult<Value> {
    if !config.persists_credentials() {
        warn!("PORTAL_CREDENTIAL_FILE is not set; the sign-in only lasts for this command");
    }

    let username = required_env("PORTAL_USERNAME")?;
    let password = required_env("PORTAL_PASSWORD")?;
    let mut notices = access.sessions().notices();

    let result = access
        .sessions()
        .login(username.as_str(), password.as_str())
        .await;
    report_notices(&mut notices);

    let session = result?;
    Ok(json!({
        "authenticated": true,
        "user": session.user().display_name(),
        "role": session.user().role().as_str(),
    }))
}

async fn logout(access: &PortalAccessService) -> AppResult<Value> {
    let mut notices = access.sessions().notices();
    let result = access.sessions().logout().await;
    report_notices(&mut notices);

    result?;
    Ok(json!({ "authenticated": false }))
}

async fn check(access: Arc<PortalAccessService>, config: &ShellConfig, portal_id: String) -> Value {
    let routes = GateRoutes::new(
        config.sign_in_route.as_str(),
        config.landing_route.as_str(),
    );
    let mut guard = PortalGuard::new(access, portal_id.as_str(), routes);
    let state = guard.verify().await;
    let decision = guard.decision();
    guard.close();

    let redirect = match &state {
        GateState::Unauthenticated { sign_in_route } => Some(sign_in_route.as_str()),
        GateState::Unauthorized { landing_route } => Some(landing_route.as_str()),
        GateState::Verifying | GateState::Authorized => None,
    };

    json!({
        "portal": portal_id,
        "state": state.as_str(),
        "decision": decision.as_str(),
        "redirect": redirect,
    })
}

async fn portals(access: &PortalAccessService) -> Value {
    let visible = access
        .visible_portals()
        .await
        .into_iter()
        .map(|portal| {
            json!({
                "id": portal.descriptor.identifier(),
                "name": portal.descriptor.display_name(),
                "description": portal.descriptor.description(),
                "route": portal.descriptor.route(),
                "badge": portal.badge.map(|badge| badge.label()),
            })
        })
        .collect::<Vec<_>>();

    Value::Array(visible)
}

fn report_notices(notices: &mut broadcast::Receiver<SessionNotice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice {
            SessionNotice::LoggedIn { display_name } => {
                info!(user = %display_name, "signed in");
            }
            SessionNotice::LoggedOut => info!("signed out"),
            SessionNotice::LoginFailed(message) => warn!(reason = %message, "sign-in failed"),
            SessionNotice::LogoutFailed(message) => warn!(reason = %message, "sign-out failed"),
        }
    }
}
