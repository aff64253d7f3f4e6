//! Admin console route table.
//!
//! Public views (login, password reset, privacy policy) always render.
//! Everything else is protected and goes through the `RouteGuard`. Unknown
//! paths fall back to the category list, the console's index view.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use crate::guard::{GuardDecision, RouteGuard};
use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminView {
    Categories,
    ProductList,
    CreateProduct,
    Cms,
    Enquiries,
    Login,
    ForgotPassword,
    PrivacyPolicy,
}

impl AdminView {
    pub const ALL: [Self; 8] = [
        Self::Categories,
        Self::ProductList,
        Self::CreateProduct,
        Self::Cms,
        Self::Enquiries,
        Self::Login,
        Self::ForgotPassword,
        Self::PrivacyPolicy,
    ];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Categories => "/",
            Self::ProductList => "/product_list",
            Self::CreateProduct => "/create_product",
            Self::Cms => "/cms",
            Self::Enquiries => "/enquiries",
            Self::Login => "/login",
            Self::ForgotPassword => "/forgot-password",
            Self::PrivacyPolicy => "/privacy-policy",
        }
    }

    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Self::Login | Self::ForgotPassword | Self::PrivacyPolicy)
    }

    /// Resolve a request path. Query strings, fragments and trailing slashes
    /// are ignored; unknown paths map to `Categories`.
    #[must_use]
    pub fn resolve(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL
            .into_iter()
            .find(|view| view.path() == normalized)
            .unwrap_or(Self::Categories)
    }
}

/// Resolve `path` and apply the guard when the view is protected.
#[must_use]
pub fn navigate(path: &str, state: &SessionState, guard: &RouteGuard) -> GuardDecision<AdminView> {
    let view = AdminView::resolve(path);
    if view.is_public() {
        return GuardDecision::Render(view);
    }
    guard.decide(state, view)
}
