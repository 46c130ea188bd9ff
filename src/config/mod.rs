//! Configuration module for the controller server
//!
//! Configuration comes from `.env` files, environment variables and an
//! optional YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//!
//! # Example
//! ```rust,no_run
//! use waav_controllers::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

mod env;
mod yaml;

pub use yaml::{ControllersYaml, ServerYaml, YamlConfig};

/// Default cap on buffered request bodies read for `get_param`
pub const DEFAULT_MAX_PARAM_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// How the final route list of a controller is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteCollection {
    /// Routes returned by `get_routes()` after `init()`
    #[default]
    Accessor,
    /// Named-action table scanned by convention, plus routes added in `init()`
    Convention,
}

impl FromStr for RouteCollection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accessor" => Ok(RouteCollection::Accessor),
            "convention" => Ok(RouteCollection::Convention),
            other => Err(ConfigError::InvalidValue {
                key: "route_collection",
                reason: format!("'{other}' (expected accessor or convention)"),
            }),
        }
    }
}

/// Controller loading configuration
///
/// # Example YAML
/// ```yaml
/// controllers:
///   enabled: true
///   route_collection: convention
///   disabled_modules:
///     - "admin/controllers/legacy"
///   denied_status: 403
///   max_param_body_bytes: 1048576
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllersConfig {
    /// Whether controller modules are loaded at all (default: true)
    pub enabled: bool,
    /// Route collection strategy used for every controller
    pub route_collection: RouteCollection,
    /// Module paths skipped at discovery
    pub disabled_modules: Vec<String>,
    /// Status returned when `is_allow` denies a request without responding itself
    pub denied_status: u16,
    /// Largest request body buffered for parameter parsing
    pub max_param_body_bytes: usize,
}

impl Default for ControllersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            route_collection: RouteCollection::default(),
            disabled_modules: Vec::new(),
            denied_status: 403,
            max_param_body_bytes: DEFAULT_MAX_PARAM_BODY_BYTES,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Controller settings
    pub controllers: ControllersConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            controllers: ControllersConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `.env` files are expected to be loaded by the binary before this call.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::apply_env(ServerConfig::default())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, on top of environment variables
    ///
    /// The configuration priority is: YAML > Environment Variables > Defaults
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        let config = yaml_config.apply(env::apply_env(ServerConfig::default())?)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let status = self.controllers.denied_status;
        let valid = status == 204 || (400..=599).contains(&status);
        if !valid {
            return Err(ConfigError::InvalidValue {
                key: "denied_status",
                reason: format!("{status} (expected 204 or a 4xx/5xx status)"),
            });
        }

        if self.controllers.max_param_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_param_body_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "0.0.0.0:3001");
        assert!(config.controllers.enabled);
        assert_eq!(config.controllers.denied_status, 403);
        assert_eq!(config.controllers.route_collection, RouteCollection::Accessor);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_route_collection_from_str() {
        assert_eq!(
            "Convention".parse::<RouteCollection>().unwrap(),
            RouteCollection::Convention
        );
        assert!("reflection".parse::<RouteCollection>().is_err());
    }

    #[test]
    fn test_validate_denied_status() {
        let mut config = ServerConfig::default();
        config.controllers.denied_status = 204;
        assert!(config.validate().is_ok());

        config.controllers.denied_status = 200;
        assert!(config.validate().is_err());

        config.controllers.denied_status = 404;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_body_limit() {
        let mut config = ServerConfig::default();
        config.controllers.max_param_body_bytes = 0;
        assert!(config.validate().is_err());
    }
}
