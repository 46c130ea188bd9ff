//! Route descriptors and per-controller route tables
//!
//! Controllers describe their routes with [`RouteDescriptor`]s. A descriptor is
//! validated by [`check_route`] and converted into a [`Route`], which is what the
//! dispatch pipeline registers on the router.

pub mod convention;
pub mod path;

use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use crate::dispatch::RouteRequest;
use crate::errors::{DispatchResult, LoadError, LoadResult};

pub use convention::{NamedAction, parse_route_name};
pub use path::{normalize, router_path};

/// HTTP verbs a route can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RouteMethod {
    #[default]
    Get,
    Post,
    /// Matches every verb
    All,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMethod::Get => "get",
            RouteMethod::Post => "post",
            RouteMethod::All => "all",
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteMethod {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(RouteMethod::Get),
            "post" => Ok(RouteMethod::Post),
            "all" => Ok(RouteMethod::All),
            other => Err(LoadError::InvalidRoute(format!(
                "unsupported method '{other}' (expected get, post or all)"
            ))),
        }
    }
}

/// Declared path of a route: one path or several paths sharing an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePath {
    Single(String),
    Many(Vec<String>),
}

impl RoutePath {
    /// Iterate the declared paths
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let paths: &[String] = match self {
            RoutePath::Single(p) => std::slice::from_ref(p),
            RoutePath::Many(ps) => ps,
        };
        paths.iter().map(String::as_str)
    }

    fn is_empty(&self) -> bool {
        match self {
            RoutePath::Single(p) => p.is_empty(),
            RoutePath::Many(ps) => ps.is_empty() || ps.iter().any(String::is_empty),
        }
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePath::Single(p) => f.write_str(p),
            RoutePath::Many(ps) => write!(f, "[{}]", ps.join(", ")),
        }
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        RoutePath::Single(path.to_string())
    }
}

impl From<String> for RoutePath {
    fn from(path: String) -> Self {
        RoutePath::Single(path)
    }
}

impl From<Vec<String>> for RoutePath {
    fn from(paths: Vec<String>) -> Self {
        RoutePath::Many(paths)
    }
}

impl From<Vec<&str>> for RoutePath {
    fn from(paths: Vec<&str>) -> Self {
        RoutePath::Many(paths.into_iter().map(str::to_string).collect())
    }
}

type ActionFn<C> =
    dyn Fn(Arc<C>, RouteRequest) -> BoxFuture<'static, DispatchResult<Response>> + Send + Sync;

/// Route callback bound to a controller instance
///
/// The controller is handed in as `Arc<C>` on every call, so an action is
/// always resolvable at registration time and never looked up by name.
pub struct Action<C>(Arc<ActionFn<C>>);

impl<C: Send + Sync + 'static> Action<C> {
    /// Wrap an async closure as an action
    ///
    /// ```ignore
    /// Action::new(|this: Arc<MyController>, req| async move {
    ///     Ok(Json(this.render(&req)))
    /// })
    /// ```
    pub fn new<F, Fut, R>(action: F) -> Self
    where
        F: Fn(Arc<C>, RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<R>> + Send + 'static,
        R: IntoResponse,
    {
        Action(Arc::new(
            move |controller: Arc<C>, request: RouteRequest| -> BoxFuture<'static, DispatchResult<Response>> {
                let fut = action(controller, request);
                Box::pin(async move { fut.await.map(IntoResponse::into_response) })
            },
        ))
    }

    /// Run the action for one request
    pub fn call(&self, controller: Arc<C>, request: RouteRequest) -> BoxFuture<'static, DispatchResult<Response>> {
        (self.0)(controller, request)
    }
}

impl<C> Clone for Action<C> {
    fn clone(&self) -> Self {
        Action(self.0.clone())
    }
}

impl<C> fmt::Debug for Action<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

/// Unvalidated route as written by a controller author
pub struct RouteDescriptor<C> {
    pub path: Option<RoutePath>,
    pub method: Option<String>,
    pub action: Option<Action<C>>,
}

impl<C: Send + Sync + 'static> RouteDescriptor<C> {
    /// Route with the default method (`get`)
    pub fn new(path: impl Into<RoutePath>, action: Action<C>) -> Self {
        Self {
            path: Some(path.into()),
            method: None,
            action: Some(action),
        }
    }

    /// Descriptor with no fields set
    pub fn empty() -> Self {
        Self {
            path: None,
            method: None,
            action: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}

impl<C> fmt::Debug for RouteDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("action", &self.action.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Validate a route descriptor without consuming it.
///
/// # Errors
///
/// [`LoadError::InvalidRoute`] when the path is missing or empty, the method is
/// not one of `get`, `post`, `all`, or the action is missing.
pub fn check_route<C>(route: &RouteDescriptor<C>) -> LoadResult<()> {
    match &route.path {
        None => {
            return Err(LoadError::InvalidRoute("path is not defined".to_string()));
        }
        Some(path) if path.is_empty() => {
            return Err(LoadError::InvalidRoute("path is empty".to_string()));
        }
        Some(_) => {}
    }

    if let Some(method) = &route.method {
        method.parse::<RouteMethod>()?;
    }

    if route.action.is_none() {
        return Err(LoadError::InvalidRoute(format!(
            "action is not defined for route {}",
            route.path.as_ref().map(ToString::to_string).unwrap_or_default()
        )));
    }

    Ok(())
}

/// Validated route, ready for registration
pub struct Route<C> {
    pub path: RoutePath,
    pub method: RouteMethod,
    pub action: Action<C>,
}

impl<C> TryFrom<RouteDescriptor<C>> for Route<C> {
    type Error = LoadError;

    fn try_from(descriptor: RouteDescriptor<C>) -> Result<Self, Self::Error> {
        check_route(&descriptor)?;
        let method = match descriptor.method {
            Some(m) => m.parse()?,
            None => RouteMethod::Get,
        };
        match (descriptor.path, descriptor.action) {
            (Some(path), Some(action)) => Ok(Route {
                path,
                method,
                action,
            }),
            _ => Err(LoadError::InvalidRoute("incomplete route".to_string())),
        }
    }
}

impl<C> fmt::Debug for Route<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Route description handed to hooks and event subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Controller type name
    pub controller: &'static str,
    pub method: RouteMethod,
    /// Path as declared by the controller
    pub declared: RoutePath,
    /// Normalized paths the route is registered at
    pub paths: Vec<String>,
}

/// Routes collected from one controller during its load
pub struct RouteTable<C> {
    controller: &'static str,
    routes: Vec<Route<C>>,
    rejected: Vec<LoadError>,
}

impl<C> RouteTable<C> {
    pub fn new(controller: &'static str) -> Self {
        Self {
            controller,
            routes: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Add one route, failing on the first validation error
    pub fn add_route(&mut self, route: RouteDescriptor<C>) -> LoadResult<()> {
        let route = Route::try_from(route)?;
        self.routes.push(route);
        Ok(())
    }

    /// Add a batch of routes; invalid entries are logged and skipped.
    ///
    /// Returns the number of routes added.
    pub fn add_routes(&mut self, routes: impl IntoIterator<Item = RouteDescriptor<C>>) -> usize {
        let mut added = 0;
        for descriptor in routes {
            let shown = format!("{descriptor:?}");
            match Route::try_from(descriptor) {
                Ok(route) => {
                    self.routes.push(route);
                    added += 1;
                }
                Err(e) => {
                    tracing::error!(
                        controller = self.controller,
                        route = %shown,
                        error = %e,
                        "Skipping invalid route"
                    );
                    self.rejected.push(e);
                }
            }
        }
        added
    }

    /// Push an already validated route
    pub fn push(&mut self, route: Route<C>) {
        self.routes.push(route);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Errors from `add_routes` entries that were skipped
    pub fn rejected(&self) -> &[LoadError] {
        &self.rejected
    }

    pub(crate) fn into_parts(self) -> (Vec<Route<C>>, Vec<LoadError>) {
        (self.routes, self.rejected)
    }
}
