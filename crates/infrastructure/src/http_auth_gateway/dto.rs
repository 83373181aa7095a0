use std::str::FromStr;

use portalgate_domain::{Permission, PortalAccess, Role, SessionUser, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub(super) username: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionResponse {
    #[serde(default)]
    pub(super) user: Option<UserResponse>,
    #[serde(default)]
    pub(super) portals: PortalAccess,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponse {
    pub(super) user: UserResponse,
    #[serde(default)]
    pub(super) portals: PortalAccess,
    #[serde(default)]
    pub(super) token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PortalCheckResponse {
    #[serde(default)]
    pub(super) has_access: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorResponse {
    #[serde(default)]
    pub(super) message: Option<String>,
    #[serde(default)]
    pub(super) error: Option<String>,
}

impl ErrorResponse {
    pub(super) fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserResponse {
    id: Value,
    #[serde(default, alias = "displayName")]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: String,
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

impl UserResponse {
    pub(super) fn into_session_user(self) -> SessionUser {
        let id = match self.id {
            Value::String(value) => value,
            other => other.to_string(),
        };
        let display_name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| id.clone());

        let permissions = self
            .permissions
            .iter()
            .filter_map(|value| match Permission::from_str(value) {
                Ok(permission) => Some(permission),
                Err(_) => {
                    warn!(permission = %value, user_id = %id, "ignoring unknown permission");
                    None
                }
            })
            .collect::<Vec<_>>();

        let mut user = SessionUser::new(UserId::new(id), display_name, Role::from(self.role))
            .with_permissions(permissions)
            .with_active(self.is_active);
        if let Some(email) = self.email {
            user = user.with_email(email);
        }

        user
    }
}
