//! Portal identifiers, access flags and the static portal catalog.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use portalgate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::Permission;

/// Known portal areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortalKey {
    /// Company administration.
    Admin,
    /// Customer self-service.
    Customer,
    /// Partner programme.
    Partner,
    /// Investor relations.
    Investor,
    /// Staff intranet.
    Employee,
    /// PeopleCore HR.
    #[serde(rename = "peoplecore")]
    PeopleCore,
}

impl PortalKey {
    /// Returns the stable identifier used in routes and backend paths.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
            Self::Partner => "partner",
            Self::Investor => "investor",
            Self::Employee => "employee",
            Self::PeopleCore => "peoplecore",
        }
    }

    /// Returns all portals in catalog order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PortalKey] = &[
            PortalKey::Admin,
            PortalKey::Customer,
            PortalKey::Partner,
            PortalKey::Investor,
            PortalKey::Employee,
            PortalKey::PeopleCore,
        ];

        ALL
    }
}

impl FromStr for PortalKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            "partner" => Ok(Self::Partner),
            "investor" => Ok(Self::Investor),
            "employee" => Ok(Self::Employee),
            "peoplecore" | "people-core" | "people_core" => Ok(Self::PeopleCore),
            _ => Err(AppError::UnknownPortal(value.to_owned())),
        }
    }
}

impl Display for PortalKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Per-portal access flags as returned by the backend for the current credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalAccess {
    /// Admin portal flag.
    pub admin: bool,
    /// Customer portal flag.
    pub customer: bool,
    /// Partner portal flag.
    pub partner: bool,
    /// Investor portal flag.
    pub investor: bool,
    /// Employee portal flag.
    pub employee: bool,
    /// PeopleCore portal flag.
    pub peoplecore: bool,
    /// Override granting every portal.
    pub all_portals: bool,
}

impl PortalAccess {
    /// Returns a record with every flag cleared.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns the raw flag for one portal, ignoring the override.
    #[must_use]
    pub fn flag(&self, key: PortalKey) -> bool {
        match key {
            PortalKey::Admin => self.admin,
            PortalKey::Customer => self.customer,
            PortalKey::Partner => self.partner,
            PortalKey::Investor => self.investor,
            PortalKey::Employee => self.employee,
            PortalKey::PeopleCore => self.peoplecore,
        }
    }

    /// Returns whether the flags allow entry to one portal.
    #[must_use]
    pub fn allows(&self, key: PortalKey) -> bool {
        self.all_portals || self.flag(key)
    }

    /// Returns a copy with one portal flag set.
    #[must_use]
    pub fn with(mut self, key: PortalKey) -> Self {
        match key {
            PortalKey::Admin => self.admin = true,
            PortalKey::Customer => self.customer = true,
            PortalKey::Partner => self.partner = true,
            PortalKey::Investor => self.investor = true,
            PortalKey::Employee => self.employee = true,
            PortalKey::PeopleCore => self.peoplecore = true,
        }
        self
    }

    /// Returns a copy with the override flag set.
    #[must_use]
    pub fn with_all_portals(mut self) -> Self {
        self.all_portals = true;
        self
    }
}

/// Static description of one portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalDescriptor {
    key: PortalKey,
    display_name: String,
    description: String,
    route: String,
    required_permission: Permission,
}

impl PortalDescriptor {
    /// Creates a descriptor whose required permission is the portal's own grant.
    pub fn new(
        key: PortalKey,
        display_name: impl Into<String>,
        description: impl Into<String>,
        route: impl Into<String>,
    ) -> AppResult<Self> {
        let route = route.into();
        if !route.starts_with('/') {
            return Err(AppError::Validation(format!(
                "portal route '{route}' must start with '/'"
            )));
        }

        Ok(Self {
            key,
            display_name: NonEmptyString::new(display_name)?.into(),
            description: description.into(),
            route,
            required_permission: Permission::for_portal(key),
        })
    }

    /// Overrides the permission that unlocks this portal.
    #[must_use]
    pub fn with_required_permission(mut self, permission: Permission) -> Self {
        self.required_permission = permission;
        self
    }

    /// Returns the portal key.
    #[must_use]
    pub fn key(&self) -> PortalKey {
        self.key
    }

    /// Returns the identifier used by routes and the backend.
    #[must_use]
    pub fn identifier(&self) -> &'static str {
        self.key.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the short description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the landing route for the portal.
    #[must_use]
    pub fn route(&self) -> &str {
        self.route.as_str()
    }

    /// Returns the permission that unlocks the portal.
    #[must_use]
    pub fn required_permission(&self) -> Permission {
        self.required_permission
    }
}

/// Ordered, immutable set of portal descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalCatalog {
    descriptors: Vec<PortalDescriptor>,
}

impl PortalCatalog {
    /// Creates a catalog, rejecting duplicate portal keys.
    pub fn new(descriptors: Vec<PortalDescriptor>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.key()) {
                return Err(AppError::Validation(format!(
                    "portal '{}' is listed more than once",
                    descriptor.key()
                )));
            }
        }

        Ok(Self { descriptors })
    }

    /// Returns the company's standard portal set.
    #[must_use]
    pub fn standard() -> Self {
        let descriptors = PortalKey::all()
            .iter()
            .map(|key| {
                let (display_name, description) = standard_copy(*key);
                PortalDescriptor {
                    key: *key,
                    display_name: display_name.to_owned(),
                    description: description.to_owned(),
                    route: format!("/portal/{}", key.as_str()),
                    required_permission: Permission::for_portal(*key),
                }
            })
            .collect();

        Self { descriptors }
    }

    /// Returns the descriptors in catalog order.
    #[must_use]
    pub fn descriptors(&self) -> &[PortalDescriptor] {
        self.descriptors.as_slice()
    }

    /// Finds the descriptor for an identifier, if the catalog lists it.
    #[must_use]
    pub fn find(&self, portal_id: &str) -> Option<&PortalDescriptor> {
        let key = PortalKey::from_str(portal_id).ok()?;
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.key() == key)
    }

    /// Resolves an identifier or fails with [`AppError::UnknownPortal`].
    pub fn resolve(&self, portal_id: &str) -> AppResult<&PortalDescriptor> {
        self.find(portal_id)
            .ok_or_else(|| AppError::UnknownPortal(portal_id.to_owned()))
    }
}

impl Default for PortalCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_copy(key: PortalKey) -> (&'static str, &'static str) {
    match key {
        PortalKey::Admin => ("Admin Portal", "Company administration and user management"),
        PortalKey::Customer => ("Customer Portal", "Orders, subscriptions and support"),
        PortalKey::Partner => ("Partner Portal", "Deal registration and partner resources"),
        PortalKey::Investor => ("Investor Portal", "Reports, filings and shareholder updates"),
        PortalKey::Employee => ("Employee Portal", "Internal tools and announcements"),
        PortalKey::PeopleCore => ("PeopleCore", "HR, payroll and time off"),
    }
}
