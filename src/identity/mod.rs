//! Seams to the external identity provider and profile store.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session holder never talks to a concrete auth backend. It consumes a
//! `Subscription` of `AuthEvent`s and resolves roles through `ProfileStore`,
//! both keyed by the provider-issued principal id.


mod subscription;

use async_trait::async_trait;

use crate::session::Role;

pub use subscription::Subscription;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider rejected request: {0}")]
    Rejected(String),
}

/// An identity-provider-confirmed actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), display_name: None, email: None }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Display label, falling back to the email and then the id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// "Current principal changed" notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Principal),
    SignedOut,
}

impl From<Option<Principal>> for AuthEvent {
    fn from(principal: Option<Principal>) -> Self {
        principal.map_or(Self::SignedOut, Self::SignedIn)
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Open a standing subscription to principal changes.
    fn subscribe(&self) -> Subscription;

    /// End the provider-side session.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Start a provider-side session. Success shows up later as an
    /// `AuthEvent::SignedIn` on open subscriptions.
    async fn sign_in_with_credentials(&self, id: &str, secret: &str) -> Result<(), ProviderError>;
}

/// Role and metadata for a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub role: Role,
    pub email: Option<String>,
}

/// Values used when a principal signs in without a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub display_name: String,
    pub role: Role,
    pub email: Option<String>,
}

impl ProfileDefaults {
    #[must_use]
    pub fn for_principal(principal: &Principal, role: Role) -> Self {
        Self { display_name: principal.label().to_owned(), role, email: principal.email.clone() }
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, principal_id: &str) -> Result<Option<Profile>, ProviderError>;

    async fn create_profile(&self, principal_id: &str, defaults: ProfileDefaults) -> Result<Profile, ProviderError>;
}
