use std::fmt::{Display, Formatter};
use std::str::FromStr;

use portalgate_core::AppError;
use serde::{Deserialize, Serialize};

use crate::PortalKey;

/// Portal permissions issued by the auth backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Grants every portal.
    #[serde(rename = "canAccessAllPortals")]
    AllPortals,
    /// Grants the admin portal.
    #[serde(rename = "canAccessAdmin")]
    AdminPortal,
    /// Grants the customer portal.
    #[serde(rename = "canAccessCustomer")]
    CustomerPortal,
    /// Grants the partner portal.
    #[serde(rename = "canAccessPartner")]
    PartnerPortal,
    /// Grants the investor portal.
    #[serde(rename = "canAccessInvestor")]
    InvestorPortal,
    /// Grants the employee portal.
    #[serde(rename = "canAccessEmployee")]
    EmployeePortal,
    /// Grants the PeopleCore HR portal.
    #[serde(rename = "canAccessPeopleCore")]
    PeopleCorePortal,
}

impl Permission {
    /// Returns the stable transport value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllPortals => "canAccessAllPortals",
            Self::AdminPortal => "canAccessAdmin",
            Self::CustomerPortal => "canAccessCustomer",
            Self::PartnerPortal => "canAccessPartner",
            Self::InvestorPortal => "canAccessInvestor",
            Self::EmployeePortal => "canAccessEmployee",
            Self::PeopleCorePortal => "canAccessPeopleCore",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::AllPortals,
            Permission::AdminPortal,
            Permission::CustomerPortal,
            Permission::PartnerPortal,
            Permission::InvestorPortal,
            Permission::EmployeePortal,
            Permission::PeopleCorePortal,
        ];

        ALL
    }

    /// Returns the permission that grants entry to one portal.
    #[must_use]
    pub fn for_portal(key: PortalKey) -> Self {
        match key {
            PortalKey::Admin => Self::AdminPortal,
            PortalKey::Customer => Self::CustomerPortal,
            PortalKey::Partner => Self::PartnerPortal,
            PortalKey::Investor => Self::InvestorPortal,
            PortalKey::Employee => Self::EmployeePortal,
            PortalKey::PeopleCore => Self::PeopleCorePortal,
        }
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Role assigned to a user by the auth backend.
///
/// Roles this client does not know are preserved as [`Role::Other`] so the
/// permission set still decides what they may see.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Company owner.
    Owner,
    /// Administrator.
    Admin,
    /// Staff member.
    Employee,
    /// Customer account.
    Customer,
    /// Partner account.
    Partner,
    /// Investor account.
    Investor,
    /// PeopleCore HR user.
    PeopleCore,
    /// Any role this client has no dedicated handling for.
    Other(String),
}

impl Role {
    /// Returns the stable transport value for this role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Employee => "employee",
            Self::Customer => "customer",
            Self::Partner => "partner",
            Self::Investor => "investor",
            Self::PeopleCore => "peoplecore",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Returns whether this role sees every portal regardless of permissions.
    #[must_use]
    pub fn has_full_access(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Returns the portal this role belongs to, if it has one.
    #[must_use]
    pub fn home_portal(&self) -> Option<PortalKey> {
        match self {
            Self::Employee => Some(PortalKey::Employee),
            Self::Customer => Some(PortalKey::Customer),
            Self::Partner => Some(PortalKey::Partner),
            Self::Investor => Some(PortalKey::Investor),
            Self::PeopleCore => Some(PortalKey::PeopleCore),
            Self::Owner | Self::Admin | Self::Other(_) => None,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Self::Owner,
            "admin" | "administrator" | "super_admin" => Self::Admin,
            "employee" => Self::Employee,
            "customer" => Self::Customer,
            "partner" => Self::Partner,
            "investor" => Self::Investor,
            "peoplecore" | "people_core" => Self::PeopleCore,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Other(value) => value,
            known => known.as_str().to_owned(),
        }
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
