//! Controller loading orchestration
//!
//! ```text
//! attach(router)
//! load_all():
//!   emit controller:before_load
//!   discover ─▶ rewrites / disabled_modules
//!   for each module, concurrently: resolve ─▶ new ─▶ init ─▶ collect routes
//!   register routes on the router, in discovery order
//!   emit controller:after_load
//! into_router()  (param middleware layered over everything)
//! ```
//!
//! A module or route that fails is logged and recorded in the [`LoadReport`];
//! it never stops the others from loading.

use axum::{Router, middleware::from_fn_with_state};
use futures::future::join_all;
use std::sync::Arc;

use crate::controller::{
    ClassTable, ControllerClass, ControllerModule, ControllerState, LoadedController, resolve,
};
use crate::discovery::{InventorySource, ModuleSource, prepare_modules};
use crate::dispatch::{RegisteredRoutes, install_route};
use crate::errors::LoadError;
use crate::events::{ControllerEvent, LoadSummary};
use crate::middleware::param_middleware;
use crate::state::AppState;

/// A controller that made it onto the router
#[derive(Debug, Clone)]
pub struct ControllerReport {
    pub module: String,
    pub controller: &'static str,
    pub state: ControllerState,
    /// Installed routes as `"<method> <path>"`
    pub routes: Vec<String>,
}

/// A module, or a single route of a module, that failed to load
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub module: String,
    /// Last state the module reached
    pub stage: ControllerState,
    pub error: LoadError,
}

/// Outcome of a load pass
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub controllers: Vec<ControllerReport>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    /// Number of installed `(method, path)` pairs
    pub fn route_count(&self) -> usize {
        self.controllers.iter().map(|c| c.routes.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn controller(&self, name: &str) -> Option<&ControllerReport> {
        self.controllers.iter().find(|c| c.controller == name)
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            controllers: self.controllers.len(),
            routes: self.route_count(),
            failures: self.failures.len(),
        }
    }
}

/// Discovers controller modules and installs their routes on a router
pub struct ControllerLoader {
    state: Arc<AppState>,
    source: Box<dyn ModuleSource>,
    classes: ClassTable,
    router: Option<Router>,
    registered: RegisteredRoutes,
}

impl ControllerLoader {
    /// Loader over link-time registered modules and classes
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            source: Box::new(InventorySource),
            classes: ClassTable::from_inventory(),
            router: None,
            registered: RegisteredRoutes::new(),
        }
    }

    pub fn with_source(mut self, source: impl ModuleSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Replace the class table used to resolve module descriptors
    pub fn with_classes(mut self, classes: ClassTable) -> Self {
        self.classes = classes;
        self
    }

    /// Make one more class available to module descriptors
    pub fn with_class(mut self, class: ControllerClass) -> Self {
        self.classes.insert(class);
        self
    }

    /// Router the controller routes are installed on
    pub fn attach(&mut self, router: Router) {
        self.router = Some(router);
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Run one load pass
    pub async fn load_all(&mut self) -> LoadReport {
        self.state.events.emit(ControllerEvent::BeforeLoad).await;

        let mut report = LoadReport::default();
        let config = &self.state.config.controllers;

        if !config.enabled {
            tracing::info!("Controller loading disabled");
        } else {
            if self.router.is_none() {
                tracing::warn!("No router attached, installing controller routes on a new router");
            }

            let discovered = self.source.discover().await;
            let found = discovered.len();
            let modules = prepare_modules(discovered, &config.disabled_modules);
            tracing::info!(found, loading = modules.len(), "Controller modules discovered");

            let results = join_all(modules.iter().map(|module| self.load_module(module))).await;

            for (module, result) in modules.iter().zip(results) {
                match result {
                    Ok(loaded) => self.register(module, loaded, &mut report),
                    Err((stage, error)) => {
                        tracing::error!(
                            module = %module.path,
                            stage = %stage,
                            error = %error,
                            "Failed to load controller"
                        );
                        report.failures.push(LoadFailure {
                            module: module.path.clone(),
                            stage,
                            error,
                        });
                    }
                }
            }
        }

        let summary = report.summary();
        tracing::info!(
            controllers = summary.controllers,
            routes = summary.routes,
            failures = summary.failures,
            "Controllers loaded"
        );
        self.state
            .events
            .emit(ControllerEvent::AfterLoad(summary))
            .await;

        report
    }

    async fn load_module(
        &self,
        module: &ControllerModule,
    ) -> Result<LoadedController, (ControllerState, LoadError)> {
        let resolved =
            resolve(module, &self.classes).map_err(|e| (ControllerState::Discovered, e))?;
        tracing::debug!(
            module = %module.path,
            controller = resolved.class.name,
            dependencies = ?resolved.dependency_keys,
            "Controller resolved"
        );
        resolved
            .instantiate(self.state.clone())
            .await
            .map_err(|e| (ControllerState::Resolved, e))
    }

    fn register(&mut self, module: &ControllerModule, loaded: LoadedController, report: &mut LoadReport) {
        let mut router = self.router.take().unwrap_or_default();
        let mut routes = Vec::new();

        for error in loaded.rejected {
            report.failures.push(LoadFailure {
                module: module.path.clone(),
                stage: ControllerState::Initialized,
                error,
            });
        }

        for binding in &loaded.bindings {
            let method = binding.info.method;
            for path in &binding.info.paths {
                match install_route(
                    &mut router,
                    &mut self.registered,
                    method,
                    path,
                    binding.method_router.clone(),
                ) {
                    Ok(()) => routes.push(format!("{method} {path}")),
                    Err(error) => {
                        tracing::error!(
                            module = %module.path,
                            controller = loaded.name,
                            method = %method,
                            path = %path,
                            error = %error,
                            "Failed to register route"
                        );
                        report.failures.push(LoadFailure {
                            module: module.path.clone(),
                            stage: ControllerState::Initialized,
                            error,
                        });
                    }
                }
            }
        }

        self.router = Some(router);
        tracing::info!(
            module = %module.path,
            controller = loaded.name,
            routes = routes.len(),
            "Controller registered"
        );
        report.controllers.push(ControllerReport {
            module: module.path.clone(),
            controller: loaded.name,
            state: ControllerState::Registered,
            routes,
        });
    }

    /// Final router with the parameter middleware layered over every route
    pub fn into_router(self) -> Router {
        let router = self.router.unwrap_or_default();
        router.layer(from_fn_with_state(self.state, param_middleware))
    }
}
