//! Session configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

use crate::session::{InvalidRole, Role};
use crate::storage::DEFAULT_SESSION_KEY;
use crate::storage::file::is_valid_key;

pub const DEFAULT_SESSION_DIR: &str = ".slj-admin";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    InvalidRole {
        var: &'static str,
        #[source]
        source: InvalidRole,
    },
    #[error("{var} must be an absolute path, got {value:?}")]
    InvalidPath { var: &'static str, value: String },
    #[error("{var} must be a plain file name (letters, digits, '_', '-', '.'), got {value:?}")]
    InvalidKey { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory backing the file key-value store.
    pub storage_dir: PathBuf,
    /// Key of the cached session slot.
    pub storage_key: String,
    /// Role the route guard requires for protected views.
    pub required_role: Role,
    /// Role given to profiles created on first sign-in.
    pub default_role: Role,
    /// Redirect target for denied navigation.
    pub login_path: String,
    /// How long a cached role is trusted before re-querying the profile
    /// store. `None` trusts the cache until sign-out.
    pub revalidate_after: Option<Duration>,
    /// Base URL of the admin REST API.
    pub api_base_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_SESSION_DIR),
            storage_key: DEFAULT_SESSION_KEY.to_owned(),
            required_role: Role::admin(),
            default_role: Role::viewer(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            revalidate_after: None,
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
        }
    }
}

impl SessionConfig {
    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `SLJ_SESSION_DIR`: default `.slj-admin`
    /// - `SLJ_SESSION_KEY`: default `health_web_admin`
    /// - `SLJ_REQUIRED_ROLE`: default `ADMIN`
    /// - `SLJ_DEFAULT_ROLE`: default `VIEWER`
    /// - `SLJ_LOGIN_PATH`: default `/login`
    /// - `SLJ_REVALIDATE_SECS`: unset trusts the cache until sign-out
    /// - `SLJ_API_BASE_URL`: default `http://localhost:3001`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable roles, a session key that is
    /// not a plain file name, or a relative login path.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let storage_dir = std::env::var("SLJ_SESSION_DIR").map_or(defaults.storage_dir, PathBuf::from);
        let storage_key = env_string("SLJ_SESSION_KEY").unwrap_or(defaults.storage_key);
        if !is_valid_key(&storage_key) {
            return Err(ConfigError::InvalidKey { var: "SLJ_SESSION_KEY", value: storage_key });
        }
        let required_role = env_role("SLJ_REQUIRED_ROLE")?.unwrap_or(defaults.required_role);
        let default_role = env_role("SLJ_DEFAULT_ROLE")?.unwrap_or(defaults.default_role);

        let login_path = env_string("SLJ_LOGIN_PATH").unwrap_or(defaults.login_path);
        if !login_path.starts_with('/') {
            return Err(ConfigError::InvalidPath { var: "SLJ_LOGIN_PATH", value: login_path });
        }

        let revalidate_after = std::env::var("SLJ_REVALIDATE_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let api_base_url = env_string("SLJ_API_BASE_URL")
            .unwrap_or(defaults.api_base_url)
            .trim_end_matches('/')
            .to_string();

        Ok(Self { storage_dir, storage_key, required_role, default_role, login_path, revalidate_after, api_base_url })
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_role(key: &'static str) -> Result<Option<Role>, ConfigError> {
    env_string(key)
        .map(|raw| Role::parse(&raw).map_err(|source| ConfigError::InvalidRole { var: key, source }))
        .transpose()
}
