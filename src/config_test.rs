use std::sync::Mutex;

use super::*;

/// Serializes tests that mutate the process environment.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: [&str; 7] = [
    "SLJ_SESSION_DIR",
    "SLJ_SESSION_KEY",
    "SLJ_REQUIRED_ROLE",
    "SLJ_DEFAULT_ROLE",
    "SLJ_LOGIN_PATH",
    "SLJ_REVALIDATE_SECS",
    "SLJ_API_BASE_URL",
];

/// # Safety
/// Callers hold `ENV_LOCK`.
unsafe fn clear_session_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
fn default_matches_constants() {
    let cfg = SessionConfig::default();
    assert_eq!(cfg.storage_dir, PathBuf::from(DEFAULT_SESSION_DIR));
    assert_eq!(cfg.storage_key, "health_web_admin");
    assert_eq!(cfg.required_role, Role::admin());
    assert_eq!(cfg.default_role, Role::viewer());
    assert_eq!(cfg.login_path, "/login");
    assert_eq!(cfg.revalidate_after, None);
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
}

#[test]
fn from_env_without_vars_is_default() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_session_env() };

    assert_eq!(SessionConfig::from_env().unwrap(), SessionConfig::default());
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_session_env();
        std::env::set_var("SLJ_SESSION_DIR", "/var/lib/slj");
        std::env::set_var("SLJ_SESSION_KEY", "admin_session");
        std::env::set_var("SLJ_REQUIRED_ROLE", "editor");
        std::env::set_var("SLJ_DEFAULT_ROLE", " guest ");
        std::env::set_var("SLJ_LOGIN_PATH", "/signin");
        std::env::set_var("SLJ_REVALIDATE_SECS", "300");
        std::env::set_var("SLJ_API_BASE_URL", "https://api.slj.test/");
    }

    let cfg = SessionConfig::from_env().unwrap();
    assert_eq!(cfg.storage_dir, PathBuf::from("/var/lib/slj"));
    assert_eq!(cfg.storage_key, "admin_session");
    assert_eq!(cfg.required_role.as_str(), "EDITOR");
    assert_eq!(cfg.default_role.as_str(), "GUEST");
    assert_eq!(cfg.login_path, "/signin");
    assert_eq!(cfg.revalidate_after, Some(Duration::from_secs(300)));
    assert_eq!(cfg.api_base_url, "https://api.slj.test");

    unsafe { clear_session_env() };
}

#[test]
fn from_env_invalid_revalidate_is_ignored() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_session_env();
        std::env::set_var("SLJ_REVALIDATE_SECS", "soon");
    }

    assert_eq!(SessionConfig::from_env().unwrap().revalidate_after, None);

    unsafe { clear_session_env() };
}

#[test]
fn from_env_rejects_bad_role() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_session_env();
        std::env::set_var("SLJ_REQUIRED_ROLE", "SUPER ADMIN");
    }

    let err = SessionConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRole { var: "SLJ_REQUIRED_ROLE", .. }));

    unsafe { clear_session_env() };
}

#[test]
fn from_env_rejects_relative_login_path() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_session_env();
        std::env::set_var("SLJ_LOGIN_PATH", "login");
    }

    let err = SessionConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("SLJ_LOGIN_PATH"));

    unsafe { clear_session_env() };
}

#[test]
fn from_env_rejects_session_key_outside_storage_dir() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    for key in ["../evil/key", "nested/key", ".hidden"] {
        unsafe {
            clear_session_env();
            std::env::set_var("SLJ_SESSION_KEY", key);
        }

        let err = SessionConfig::from_env().unwrap_err();
        assert!(matches!(&err, ConfigError::InvalidKey { var: "SLJ_SESSION_KEY", value } if value == key));
    }

    unsafe { clear_session_env() };
}
