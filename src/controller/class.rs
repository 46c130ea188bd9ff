//! Controller classes and per-controller loading
//!
//! A [`ControllerClass`] is the type-erased handle the resolver works with: a
//! name plus a function pointer that runs the whole load sequence for one
//! concrete controller type. Function pointers keep it `const`-constructible,
//! so classes can be submitted with `inventory::submit!`.

use axum::routing::MethodRouter;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Controller;
use crate::config::RouteCollection;
use crate::discovery::{ControllerRegistration, StaticExport};
use crate::dispatch::RouteHandler;
use crate::errors::{LoadError, LoadResult};
use crate::isolation::{call_safely, call_safely_async};
use crate::route::{RouteInfo, RouteTable, convention::convention_routes, normalize, router_path};
use crate::services::Dependencies;
use crate::state::AppState;

/// Loads one controller type: construct, init, collect and bind its routes
pub type LoadFn =
    fn(Arc<AppState>, Dependencies, &'static str) -> BoxFuture<'static, LoadResult<LoadedController>>;

/// Named, type-erased controller type
#[derive(Clone, Copy)]
pub struct ControllerClass {
    pub name: &'static str,
    load: LoadFn,
}

impl ControllerClass {
    /// Class handle for controller type `C`
    pub const fn of<C: Controller>(name: &'static str) -> Self {
        Self {
            name,
            load: load_controller::<C>,
        }
    }

    /// Run the load sequence with already resolved dependencies
    pub fn load(&self, state: Arc<AppState>, deps: Dependencies) -> BoxFuture<'static, LoadResult<LoadedController>> {
        (self.load)(state, deps, self.name)
    }
}

impl fmt::Debug for ControllerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerClass")
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for ControllerClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

inventory::collect!(ControllerClass);

/// Controller classes known by name, for module descriptors
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: HashMap<&'static str, ControllerClass>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every class submitted at link time, including classes exported
    /// directly by registered modules
    pub fn from_inventory() -> Self {
        let mut table = Self::new();
        for class in inventory::iter::<ControllerClass> {
            table.insert(*class);
        }
        for registration in inventory::iter::<ControllerRegistration> {
            if let StaticExport::Class(class) = registration.export {
                table.insert(class);
            }
        }
        tracing::debug!(classes = table.len(), "Controller classes collected");
        table
    }

    pub fn with(mut self, class: ControllerClass) -> Self {
        self.insert(class);
        self
    }

    pub fn insert(&mut self, class: ControllerClass) {
        if self.classes.insert(class.name, class).is_some() {
            tracing::warn!(class = class.name, "Controller class registered twice, keeping the last one");
        }
    }

    pub fn get(&self, name: &str) -> Option<ControllerClass> {
        self.classes.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// One route bound to its controller instance, ready to install
pub struct RouteBinding {
    pub info: Arc<RouteInfo>,
    pub method_router: MethodRouter,
}

impl fmt::Debug for RouteBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.info.method, self.info.paths)
    }
}

/// Result of loading one controller
#[derive(Debug)]
pub struct LoadedController {
    pub name: &'static str,
    pub prefix: Option<String>,
    pub bindings: Vec<RouteBinding>,
    /// Routes skipped by `add_routes` during `init()`
    pub rejected: Vec<LoadError>,
}

fn load_controller<C: Controller>(
    state: Arc<AppState>,
    deps: Dependencies,
    name: &'static str,
) -> BoxFuture<'static, LoadResult<LoadedController>> {
    Box::pin(async move {
        let mut controller = call_safely(
            || C::new(state.clone(), deps),
            |msg| LoadError::init(name, format!("constructor panicked: {msg}")),
        )?;

        let collection = state.config.controllers.route_collection;
        let mut table = RouteTable::<C>::new(name);
        if collection == RouteCollection::Convention {
            for route in convention_routes(C::named_actions()) {
                table.push(route);
            }
        }

        call_safely_async(controller.init(&mut table), |msg| {
            LoadError::init(name, format!("init panicked: {msg}"))
        })
        .await?;

        let (registered, rejected) = table.into_parts();
        let routes = match collection {
            RouteCollection::Accessor => {
                call_safely_async(
                    async { Ok::<_, LoadError>(controller.get_routes(registered).await) },
                    |msg| LoadError::init(name, format!("get_routes panicked: {msg}")),
                )
                .await?
            }
            RouteCollection::Convention => registered,
        };

        let prefix = controller.prefix().map(str::to_string);
        if let Some(prefix) = &prefix {
            normalize(Some(prefix.as_str()), "/")?;
        }

        let controller = Arc::new(controller);
        let mut bindings = Vec::with_capacity(routes.len());
        for route in routes {
            let paths = route
                .path
                .iter()
                .map(|p| normalize(prefix.as_deref(), p).map(|n| router_path(&n)))
                .collect::<LoadResult<Vec<_>>>()?;

            let info = Arc::new(RouteInfo {
                controller: name,
                method: route.method,
                declared: route.path,
                paths,
            });
            let handler = RouteHandler::new(controller.clone(), route.action, info.clone(), state.clone());
            bindings.push(RouteBinding {
                method_router: handler.method_router(),
                info,
            });
        }

        tracing::debug!(
            controller = name,
            prefix = ?prefix,
            routes = bindings.len(),
            "Controller initialized"
        );

        Ok(LoadedController {
            name,
            prefix,
            bindings,
            rejected,
        })
    })
}
