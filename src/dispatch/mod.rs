//! Request dispatch pipeline
//!
//! Every registered route runs the same sequence per request:
//!
//! 1. emit `controller:before_call_route` and wait for every subscriber
//! 2. `controller.before_call_route(route, request)`
//! 3. `controller.is_allow(request)`
//! 4. the route action, only when access was granted
//!
//! A failure anywhere in steps 2-4, a panic included, is logged with the
//! route path and forwarded as a [`DispatchError`] response.

pub mod request;

use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{MethodRouter, any, get, post},
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::controller::{Access, Controller};
use crate::errors::{DispatchError, DispatchResult, LoadError, LoadResult};
use crate::events::{ControllerEvent, RouteCall};
use crate::isolation::{call_safely, call_safely_async};
use crate::route::{Action, RouteInfo, RouteMethod};
use crate::state::AppState;

pub use request::RouteRequest;

/// A route action bound to its controller instance
pub struct RouteHandler<C> {
    controller: Arc<C>,
    action: Action<C>,
    route: Arc<RouteInfo>,
    state: Arc<AppState>,
}

impl<C: Controller> RouteHandler<C> {
    pub fn new(controller: Arc<C>, action: Action<C>, route: Arc<RouteInfo>, state: Arc<AppState>) -> Arc<Self> {
        Arc::new(Self {
            controller,
            action,
            route,
            state,
        })
    }

    /// axum method router for the route's verb
    pub fn method_router(self: Arc<Self>) -> MethodRouter {
        let method = self.route.method;
        let handler = move |request: Request| {
            let this = self.clone();
            async move { this.handle(request).await }
        };
        match method {
            RouteMethod::Get => get(handler),
            RouteMethod::Post => post(handler),
            RouteMethod::All => any(handler),
        }
    }

    /// Run the pipeline for one request; never fails
    pub async fn handle(&self, request: Request) -> Response {
        let uri = request.uri().clone();
        match call_safely_async(self.run(request), DispatchError::Panic).await {
            Ok(response) => response,
            Err(e) => {
                let path = self.route.declared.to_string();
                tracing::error!(
                    controller = self.route.controller,
                    route = %path,
                    uri = %uri,
                    error = %e,
                    "Route handler failed"
                );
                e.into_forwarded_response(Some(path))
            }
        }
    }

    async fn run(&self, request: Request) -> DispatchResult<Response> {
        let mut request = RouteRequest::from_request(request, self.route.clone()).await?;

        self.state
            .events
            .emit(ControllerEvent::BeforeCallRoute(RouteCall {
                route: (*self.route).clone(),
                method: request.method().clone(),
                uri: request.uri().clone(),
                headers: request.headers().clone(),
            }))
            .await;

        self.controller
            .before_call_route(&self.route, &mut request)
            .await?;

        match self.controller.is_allow(&request).await? {
            Access::Granted => self.action.call(self.controller.clone(), request).await,
            Access::Denied => {
                let status = StatusCode::from_u16(self.state.config.controllers.denied_status)
                    .unwrap_or(StatusCode::FORBIDDEN);
                tracing::debug!(
                    controller = self.route.controller,
                    route = %self.route.declared,
                    status = status.as_u16(),
                    "Access denied, action skipped"
                );
                Ok(status.into_response())
            }
            Access::Respond(response) => Ok(response),
        }
    }
}

/// `(method, path)` pairs already installed on the router
#[derive(Debug, Default)]
pub struct RegisteredRoutes {
    routes: HashMap<String, Vec<RouteMethod>>,
}

impl RegisteredRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when `method` at `path` would overlap an installed route.
    ///
    /// `all` overlaps every verb.
    pub fn check(&self, method: RouteMethod, path: &str) -> LoadResult<()> {
        let Some(methods) = self.routes.get(path) else {
            return Ok(());
        };
        let overlaps = methods
            .iter()
            .any(|m| *m == method || *m == RouteMethod::All || method == RouteMethod::All);
        if overlaps {
            return Err(LoadError::DuplicateRoute {
                method: method.to_string(),
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, method: RouteMethod, path: &str) {
        self.routes.entry(path.to_string()).or_default().push(method);
    }

    pub fn contains(&self, method: RouteMethod, path: &str) -> bool {
        self.routes
            .get(path)
            .is_some_and(|methods| methods.contains(&method))
    }

    /// Number of installed `(method, path)` pairs
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Install a method router at `path`.
///
/// Duplicates are rejected up front; anything else the router refuses (a
/// malformed or conflicting path pattern) is reported as
/// [`LoadError::InvalidRoute`] and leaves `router` unchanged.
pub fn install_route(
    router: &mut Router,
    registered: &mut RegisteredRoutes,
    method: RouteMethod,
    path: &str,
    method_router: MethodRouter,
) -> LoadResult<()> {
    registered.check(method, path)?;

    let candidate = router.clone();
    let updated = call_safely(
        move || Ok(candidate.route(path, method_router)),
        |msg| LoadError::InvalidRoute(format!("{path}: {msg}")),
    )?;

    *router = updated;
    registered.insert(method, path);
    tracing::debug!(method = %method, path = %path, "Route registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_detection() {
        let mut registered = RegisteredRoutes::new();
        registered.insert(RouteMethod::Get, "/a");

        assert!(registered.check(RouteMethod::Post, "/a").is_ok());
        assert!(registered.check(RouteMethod::Get, "/b").is_ok());
        assert_eq!(
            registered.check(RouteMethod::Get, "/a").unwrap_err(),
            LoadError::DuplicateRoute {
                method: "get".to_string(),
                path: "/a".to_string(),
            }
        );
        assert!(registered.check(RouteMethod::All, "/a").is_err());
    }

    #[test]
    fn test_all_blocks_every_verb() {
        let mut registered = RegisteredRoutes::new();
        registered.insert(RouteMethod::All, "/any");
        assert!(registered.check(RouteMethod::Get, "/any").is_err());
        assert!(registered.check(RouteMethod::Post, "/any").is_err());
    }

    #[test]
    fn test_install_route_records_path() {
        let mut router = Router::new();
        let mut registered = RegisteredRoutes::new();
        install_route(&mut router, &mut registered, RouteMethod::Get, "/a", get(|| async { "a" })).unwrap();
        install_route(&mut router, &mut registered, RouteMethod::Post, "/a", post(|| async { "a" })).unwrap();

        assert!(registered.contains(RouteMethod::Get, "/a"));
        assert!(registered.contains(RouteMethod::Post, "/a"));
        assert_eq!(registered.len(), 2);
    }

    #[test]
    fn test_install_route_contains_router_panic() {
        let mut router = Router::new();
        let mut registered = RegisteredRoutes::new();
        let err = install_route(&mut router, &mut registered, RouteMethod::Get, "users", get(|| async { "a" }))
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidRoute(_)));
        assert!(registered.is_empty());
    }
}
