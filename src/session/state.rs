//! Runtime session state as seen by consumers.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use super::record::SessionRecord;

/// Who, if anyone, is currently signed in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The identity provider has not answered yet and no usable cache exists.
    #[default]
    Loading,
    /// No principal, confirmed by the provider or after sign-out.
    Unauthenticated,
    /// A principal is current for this process lifetime.
    Authenticated(SessionRecord),
}

impl SessionState {
    /// Build the start-up state from an optional cached record.
    #[must_use]
    pub fn from_cache(cached: Option<SessionRecord>) -> Self {
        cached.map_or(Self::Loading, Self::Authenticated)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn record(&self) -> Option<&SessionRecord> {
        match self {
            Self::Authenticated(record) => Some(record),
            Self::Loading | Self::Unauthenticated => None,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

/// The single value published by the holder.
///
/// `confirmed` is false while an optimistically restored cache has not yet
/// been matched by a provider notification. `revision` advances once per
/// handled event or command, whether or not `state` changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub confirmed: bool,
    pub revision: u64,
}

impl SessionSnapshot {
    #[must_use]
    pub fn initial(cached: Option<SessionRecord>) -> Self {
        Self { state: SessionState::from_cache(cached), confirmed: false, revision: 0 }
    }
}
