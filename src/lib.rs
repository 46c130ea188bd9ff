pub mod config;
pub mod controller;
pub mod controllers;
pub mod discovery;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod isolation;
pub mod loader;
pub mod middleware;
pub mod route;
pub mod services;
pub mod state;

// Used by the registration macros
#[doc(hidden)]
pub use inventory;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use controller::{Access, Controller};
pub use errors::{DispatchError, DispatchResult, ForwardedError, LoadError, LoadResult};
pub use loader::{ControllerLoader, LoadReport};
pub use state::AppState;

/// Everything a controller implementation usually needs
pub mod prelude {
    pub use crate::controller::{Access, Controller, ControllerClass};
    pub use crate::dispatch::RouteRequest;
    pub use crate::errors::{DispatchError, DispatchResult, LoadError, LoadResult};
    pub use crate::route::{
        Action, NamedAction, Route, RouteDescriptor, RouteInfo, RouteMethod, RoutePath, RouteTable,
    };
    pub use crate::services::Dependencies;
    pub use crate::state::AppState;
    pub use crate::{register_controller, register_controller_class};
    // Re-export commonly needed external crates
    pub use async_trait::async_trait;
    pub use inventory;
    pub use std::sync::Arc;
}
