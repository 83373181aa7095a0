use serde::{Deserialize, Serialize};

/// Outcome of gating one navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Resolution is still in flight.
    Pending,
    /// The destination must not render.
    Denied,
    /// The destination may render.
    Granted,
}

impl AccessDecision {
    /// Returns a stable label for this decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Denied => "denied",
            Self::Granted => "granted",
        }
    }
}

/// Result of one portal access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheck {
    /// Whether the caller may enter the portal.
    pub has_access: bool,
    /// Whether the check has not resolved yet.
    pub pending: bool,
}

impl AccessCheck {
    /// A check that is still in flight.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            has_access: false,
            pending: true,
        }
    }

    /// A resolved check that allows entry.
    #[must_use]
    pub fn granted() -> Self {
        Self {
            has_access: true,
            pending: false,
        }
    }

    /// A resolved check that refuses entry.
    #[must_use]
    pub fn denied() -> Self {
        Self {
            has_access: false,
            pending: false,
        }
    }

    /// Maps the check onto a gating decision.
    #[must_use]
    pub fn decision(&self) -> AccessDecision {
        match (self.pending, self.has_access) {
            (true, _) => AccessDecision::Pending,
            (false, true) => AccessDecision::Granted,
            (false, false) => AccessDecision::Denied,
        }
    }
}

impl From<bool> for AccessCheck {
    fn from(has_access: bool) -> Self {
        if has_access {
            Self::granted()
        } else {
            Self::denied()
        }
    }
}
