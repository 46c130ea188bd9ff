//! Controllers
//!
//! A controller is a type that owns a group of routes under an optional
//! prefix. The loader constructs one instance per load pass, runs its
//! `init()` hook, collects its routes and freezes it into an `Arc` that every
//! registered handler closes over.
//!
//! # Example
//!
//! ```ignore
//! use waav_controllers::prelude::*;
//!
//! struct TestController;
//!
//! #[async_trait]
//! impl Controller for TestController {
//!     fn new(_state: Arc<AppState>, _deps: Dependencies) -> LoadResult<Self> {
//!         Ok(TestController)
//!     }
//!
//!     fn prefix(&self) -> Option<&str> {
//!         Some("/test")
//!     }
//!
//!     async fn init(&mut self, routes: &mut RouteTable<Self>) -> LoadResult<()> {
//!         routes.add_route(RouteDescriptor::new(
//!             "/",
//!             Action::new(|_this: Arc<Self>, _req| async { Ok("test") }),
//!         ))
//!     }
//! }
//!
//! register_controller!("plugins/test/controllers/test", class: TestController);
//! ```

pub mod class;
pub mod lifecycle;
pub mod macros;
pub mod resolver;

use async_trait::async_trait;
use axum::response::Response;
use std::sync::Arc;

use crate::dispatch::RouteRequest;
use crate::errors::{DispatchResult, LoadResult};
use crate::route::{NamedAction, Route, RouteInfo, RouteTable};
use crate::services::Dependencies;
use crate::state::AppState;

pub use class::{ClassTable, ControllerClass, LoadedController, RouteBinding};
pub use lifecycle::ControllerState;
pub use resolver::{ControllerModule, ModuleExport, ResolvedController, resolve};

/// Outcome of a controller's permission check
#[derive(Debug)]
pub enum Access {
    /// Run the action
    Granted,
    /// Skip the action and answer with the configured denied status
    Denied,
    /// Skip the action and answer with this response
    Respond(Response),
}

impl From<bool> for Access {
    fn from(allowed: bool) -> Self {
        if allowed { Access::Granted } else { Access::Denied }
    }
}

/// Behaviour shared by every controller
#[async_trait]
pub trait Controller: Send + Sync + Sized + 'static {
    /// Build the controller from the shared state and its resolved
    /// dependencies (in the order the module descriptor declared them)
    fn new(state: Arc<AppState>, deps: Dependencies) -> LoadResult<Self>;

    /// Path prepended to every route of this controller
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Runs once after construction, before any route is read
    async fn init(&mut self, _routes: &mut RouteTable<Self>) -> LoadResult<()> {
        Ok(())
    }

    /// Declarative `<name><Verb>Route` table used by convention collection
    fn named_actions() -> Vec<NamedAction<Self>> {
        Vec::new()
    }

    /// Final route list for accessor collection.
    ///
    /// Receives the routes registered during `init()`.
    async fn get_routes(&self, registered: Vec<Route<Self>>) -> Vec<Route<Self>> {
        registered
    }

    /// Runs before the permission check of every request
    async fn before_call_route(
        &self,
        _route: &RouteInfo,
        _request: &mut RouteRequest,
    ) -> DispatchResult<()> {
        Ok(())
    }

    /// Permission check; the action only runs on [`Access::Granted`]
    async fn is_allow(&self, _request: &RouteRequest) -> DispatchResult<Access> {
        Ok(Access::Granted)
    }
}
