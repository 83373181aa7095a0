use std::env;
use std::path::PathBuf;
use std::time::Duration;

use portalgate_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub api_base_url: Url,
    pub session_ttl: Duration,
    pub http_timeout: Duration,
    pub credential_file: Option<PathBuf>,
    pub sign_in_route: String,
    pub landing_route: String,
}

impl ShellConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let raw_base_url = optional(&lookup, "PORTAL_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        let api_base_url = Url::parse(raw_base_url.trim_end_matches('/')).map_err(|error| {
            AppError::Validation(format!("invalid PORTAL_API_BASE_URL: {error}"))
        })?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(AppError::Validation(
                "PORTAL_API_BASE_URL must use http or https".to_owned(),
            ));
        }

        let session_ttl_seconds = parse_u64(&lookup, "PORTAL_SESSION_TTL_SECONDS", 300)?;
        let http_timeout_seconds = parse_u64(&lookup, "PORTAL_HTTP_TIMEOUT_SECONDS", 15)?;

        if session_ttl_seconds == 0 {
            return Err(AppError::Validation(
                "PORTAL_SESSION_TTL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if http_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "PORTAL_HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        let credential_file = optional(&lookup, "PORTAL_CREDENTIAL_FILE").map(PathBuf::from);
        let sign_in_route = route(&lookup, "PORTAL_SIGN_IN_ROUTE", "/login")?;
        let landing_route = route(&lookup, "PORTAL_LANDING_ROUTE", "/")?;

        Ok(Self {
            api_base_url,
            session_ttl: Duration::from_secs(session_ttl_seconds),
            http_timeout: Duration::from_secs(http_timeout_seconds),
            credential_file,
            sign_in_route,
            landing_route,
        })
    }

    /// Whether a sign-in survives this process. Without a credential file the
    /// token lives in memory only.
    pub fn persists_credentials(&self) -> bool {
        self.credential_file.is_some()
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

pub fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> AppResult<u64> {
    match optional(lookup, name) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|error| AppError::Validation(format!("invalid {name} value: {error}"))),
        None => Ok(default),
    }
}

fn route(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> AppResult<String> {
    let value = optional(lookup, name).unwrap_or_else(|| default.to_owned());
    if !value.starts_with('/') {
        return Err(AppError::Validation(format!("{name} must start with '/'")));
    }

    Ok(value)
}
