//! Signed-in principal as last confirmed by the identity provider.
//!
//! DESIGN
//! ======
//! A `SessionRecord` is either absent or fully populated. `Role` rejects
//! blank values at deserialization time so a half-written cache entry can
//! never come back as a record with an empty role.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "ADMIN";
pub const VIEWER_ROLE: &str = "VIEWER";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0:?}")]
pub struct InvalidRole(pub String);

/// Capability tag attached to a principal. Stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    #[must_use]
    pub fn admin() -> Self {
        Self(ADMIN_ROLE.to_owned())
    }

    #[must_use]
    pub fn viewer() -> Self {
        Self(VIEWER_ROLE.to_owned())
    }

    /// Normalize `raw` into a role tag.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRole`] if `raw` is blank or contains whitespace.
    pub fn parse(raw: &str) -> Result<Self, InvalidRole> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(InvalidRole(raw.to_owned()));
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Role {
    type Error = InvalidRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

/// A signed-in principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Provider-issued identifier, stable across sessions.
    pub identity: String,
    /// Human-readable label. Advisory only.
    pub display_name: String,
    /// Drives the route guard's decision.
    pub role: Role,
    /// Contact address. Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionRecord {
    #[must_use]
    pub fn new(identity: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self { identity: identity.into(), display_name: display_name.into(), role, email: None }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// True when the record carries a usable identity.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.identity.trim().is_empty()
    }

    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        &self.role == role
    }
}
