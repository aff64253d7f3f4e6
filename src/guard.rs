//! Access decision in front of every protected view.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views ask the guard on every navigation and render whatever it returns.
//! The guard reads `SessionState` and nothing else: it holds no state and
//! never sees errors from the session layer.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::config::SessionConfig;
use crate::session::{Role, SessionHolder, SessionState};

/// What the protected view should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision<T> {
    /// Session still loading: neutral indicator, no redirect, no content.
    Waiting,
    /// Access denied: go to this path. The attempted destination is dropped.
    Redirect(String),
    Render(T),
}

impl<T> GuardDecision<T> {
    #[must_use]
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GuardDecision<U> {
        match self {
            Self::Waiting => GuardDecision::Waiting,
            Self::Redirect(path) => GuardDecision::Redirect(path),
            Self::Render(content) => GuardDecision::Render(f(content)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    required_role: Role,
    login_path: String,
}

impl RouteGuard {
    pub fn new(required_role: Role, login_path: impl Into<String>) -> Self {
        Self { required_role, login_path: login_path.into() }
    }

    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.required_role.clone(), config.login_path.clone())
    }

    #[must_use]
    pub fn required_role(&self) -> &Role {
        &self.required_role
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// True iff `state` is authenticated with exactly the required role.
    #[must_use]
    pub fn allows(&self, state: &SessionState) -> bool {
        state.record().is_some_and(|record| record.has_role(&self.required_role))
    }

    pub fn decide<T>(&self, state: &SessionState, content: T) -> GuardDecision<T> {
        if state.is_loading() {
            return GuardDecision::Waiting;
        }
        if self.allows(state) {
            GuardDecision::Render(content)
        } else {
            GuardDecision::Redirect(self.login_path.clone())
        }
    }

    /// Decide against the holder's current state.
    pub fn check<T>(&self, holder: &SessionHolder, content: T) -> GuardDecision<T> {
        self.decide(&holder.state(), content)
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}
