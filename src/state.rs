//! Shared application state
//!
//! Every controller receives an `Arc<AppState>` as its leading constructor
//! argument: configuration, the service registry used for dependency
//! injection and the lifecycle event bus.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::events::EventBus;
use crate::services::ServiceRegistry;

pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub services: ServiceRegistry,
    pub events: EventBus,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            services: ServiceRegistry::new(),
            events: EventBus::new(),
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("services", &self.services.len())
            .finish()
    }
}
