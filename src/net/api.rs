//! REST helpers for the admin auth endpoints.
//!
//! ERROR HANDLING
//! ==============
//! Forms are validated before any request goes out. A reply with
//! `success: false` is a `Rejected` error carrying the server's message so
//! the caller can show it as-is.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::forms::{FieldErrors, ResetPasswordForm};

pub const RESET_PASSWORD_PATH: &str = "/api/admin/auth/reset-password";
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid form: {0}")]
    Invalid(#[from] FieldErrors),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    email: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl ApiReply {
    fn into_result(self, fallback: &str) -> Result<(), ApiError> {
        if self.success {
            return Ok(());
        }
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_owned());
        Err(ApiError::Rejected(message))
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

#[derive(Debug, Clone)]
pub struct AdminApi {
    client: reqwest::Client,
    base_url: String,
}

impl AdminApi {
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, base_url: base_url.into() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reset the password of a registered admin account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Invalid`] before sending if the form fails
    /// validation, [`ApiError::Http`] on transport or decode failure, and
    /// [`ApiError::Rejected`] when the server declines.
    pub async fn reset_password(&self, form: &ResetPasswordForm) -> Result<(), ApiError> {
        form.validate()?;
        let url = endpoint(&self.base_url, RESET_PASSWORD_PATH);
        let body = ResetPasswordRequest { email: form.email.trim(), new_password: &form.new_password };

        let reply: ApiReply = self.client.post(&url).json(&body).send().await?.json().await?;
        match reply.into_result("Password reset failed") {
            Ok(()) => {
                info!(email = %body.email, "password reset accepted");
                Ok(())
            }
            Err(e) => {
                warn!(email = %body.email, error = %e, "password reset rejected");
                Err(e)
            }
        }
    }
}
