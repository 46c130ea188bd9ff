use serde::Deserialize;
use std::path::PathBuf;

use super::{ConfigError, RouteCollection, ServerConfig};

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// controllers:
///   enabled: true
///   route_collection: accessor
///   disabled_modules: []
///   denied_status: 403
///   max_param_body_bytes: 2097152
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub controllers: Option<ControllersYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Controller loading configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ControllersYaml {
    pub enabled: Option<bool>,
    pub route_collection: Option<RouteCollection>,
    pub disabled_modules: Option<Vec<String>>,
    pub denied_status: Option<u16>,
    pub max_param_body_bytes: Option<usize>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Overlay the values present in the file on `base`
    pub fn apply(self, mut base: ServerConfig) -> Result<ServerConfig, ConfigError> {
        if let Some(server) = self.server {
            if let Some(host) = server.host {
                base.host = host;
            }
            if let Some(port) = server.port {
                base.port = port;
            }
        }

        if let Some(controllers) = self.controllers {
            let target = &mut base.controllers;
            if let Some(enabled) = controllers.enabled {
                target.enabled = enabled;
            }
            if let Some(strategy) = controllers.route_collection {
                target.route_collection = strategy;
            }
            if let Some(disabled) = controllers.disabled_modules {
                target.disabled_modules = disabled;
            }
            if let Some(status) = controllers.denied_status {
                target.denied_status = status;
            }
            if let Some(limit) = controllers.max_param_body_bytes {
                target.max_param_body_bytes = limit;
            }
        }

        Ok(base)
    }
}
