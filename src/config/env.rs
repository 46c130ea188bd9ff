//! Environment variable loading
//!
//! | Variable                          | Field                               |
//! |-----------------------------------|-------------------------------------|
//! | `HOST`                            | `host`                              |
//! | `PORT`                            | `port`                              |
//! | `CONTROLLERS_ENABLED`             | `controllers.enabled`               |
//! | `CONTROLLERS_ROUTE_COLLECTION`    | `controllers.route_collection`      |
//! | `CONTROLLERS_DISABLED_MODULES`    | `controllers.disabled_modules` (comma-separated) |
//! | `CONTROLLERS_DENIED_STATUS`       | `controllers.denied_status`         |
//! | `CONTROLLERS_MAX_PARAM_BODY_BYTES`| `controllers.max_param_body_bytes`  |

use std::str::FromStr;

use super::{ConfigError, ServerConfig};

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            reason: format!("'{value}': {e}"),
        })
}

/// Overlay environment variables on `config`
pub(super) fn apply_env(mut config: ServerConfig) -> Result<ServerConfig, ConfigError> {
    if let Some(host) = var("HOST") {
        config.host = host;
    }
    if let Some(port) = var("PORT") {
        config.port = parse("PORT", &port)?;
    }

    let controllers = &mut config.controllers;
    if let Some(enabled) = var("CONTROLLERS_ENABLED") {
        controllers.enabled = parse("CONTROLLERS_ENABLED", &enabled)?;
    }
    if let Some(strategy) = var("CONTROLLERS_ROUTE_COLLECTION") {
        controllers.route_collection = strategy.parse()?;
    }
    if let Some(disabled) = var("CONTROLLERS_DISABLED_MODULES") {
        controllers.disabled_modules = disabled
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(status) = var("CONTROLLERS_DENIED_STATUS") {
        controllers.denied_status = parse("CONTROLLERS_DENIED_STATUS", &status)?;
    }
    if let Some(limit) = var("CONTROLLERS_MAX_PARAM_BODY_BYTES") {
        controllers.max_param_body_bytes = parse("CONTROLLERS_MAX_PARAM_BODY_BYTES", &limit)?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteCollection;
    use serial_test::serial;

    const KEYS: [&str; 7] = [
        "HOST",
        "PORT",
        "CONTROLLERS_ENABLED",
        "CONTROLLERS_ROUTE_COLLECTION",
        "CONTROLLERS_DISABLED_MODULES",
        "CONTROLLERS_DENIED_STATUS",
        "CONTROLLERS_MAX_PARAM_BODY_BYTES",
    ];

    fn clear_env() {
        for key in KEYS {
            // SAFETY: tests touching the environment are serialized
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set(key: &str, value: &str) {
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    #[serial]
    fn test_env_overrides_defaults() {
        clear_env();
        set("HOST", "127.0.0.1");
        set("PORT", "8080");
        set("CONTROLLERS_ROUTE_COLLECTION", "convention");
        set("CONTROLLERS_DISABLED_MODULES", "a/controllers/x, b/controllers/y,");
        set("CONTROLLERS_DENIED_STATUS", "404");

        let config = apply_env(ServerConfig::default()).unwrap();
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.controllers.route_collection, RouteCollection::Convention);
        assert_eq!(
            config.controllers.disabled_modules,
            vec!["a/controllers/x".to_string(), "b/controllers/y".to_string()]
        );
        assert_eq!(config.controllers.denied_status, 404);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port() {
        clear_env();
        set("PORT", "not-a-port");
        let err = apply_env(ServerConfig::default()).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_empty_values_ignored() {
        clear_env();
        set("HOST", "  ");
        let config = apply_env(ServerConfig::default()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        clear_env();
    }
}
