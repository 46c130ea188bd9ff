//! Load-time error types
//!
//! Everything that can go wrong between discovering a controller module and
//! installing its routes on the router.

use thiserror::Error;

/// Result type for controller loading
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised while resolving controllers and registering their routes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    // ─────────────────────────────────────────────────────────────────────────────
    // Route errors (the offending route is skipped)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Malformed route descriptor
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// A handler is already installed for this method and path
    #[error("Duplicate route: {method} {path}")]
    DuplicateRoute { method: String, path: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Controller errors (the offending controller is skipped)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Module export is neither a controller class nor a valid descriptor
    #[error("Invalid controller type in module '{module}': {reason}")]
    InvalidControllerType { module: String, reason: String },

    /// Descriptor object without a `controller` entry
    #[error("Missing controller entry in module '{0}'")]
    MissingController(String),

    /// Controller prefix normalizes to the bare root
    #[error("Invalid prefix '{0}': a controller prefix cannot be the root path")]
    InvalidPrefix(String),

    /// Declared dependency is not in the service registry
    #[error("Service '{0}' not found in registry")]
    ServiceNotFound(String),

    /// Resolved dependency does not have the type the controller expects
    #[error("Dependency '{key}' has an unexpected type (expected {expected})")]
    DependencyType { key: String, expected: &'static str },

    /// Controller constructor or `init()` hook failed
    #[error("Controller '{controller}' failed to initialize: {reason}")]
    Init { controller: String, reason: String },
}

impl LoadError {
    /// Build an [`LoadError::Init`] from any displayable error
    pub fn init(controller: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        LoadError::Init {
            controller: controller.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error only affects a single route of a controller
    pub fn is_route_error(&self) -> bool {
        matches!(
            self,
            LoadError::InvalidRoute(_) | LoadError::DuplicateRoute { .. }
        )
    }
}
