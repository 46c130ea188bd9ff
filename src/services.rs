//! Service registry used for controller dependency injection
//!
//! Services are stored type-erased under string keys (e.g. `"test:test"`).
//! A controller module descriptor lists the keys it needs; they are resolved
//! in order and handed to the controller constructor as [`Dependencies`].

use dashmap::DashMap;
use std::any::{Any, type_name};
use std::sync::Arc;

use crate::errors::{LoadError, LoadResult};

/// Type-erased shared service
pub type Service = Arc<dyn Any + Send + Sync>;

/// Registry of services available to controllers
#[derive(Default)]
pub struct ServiceRegistry {
    services: DashMap<String, Service>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service value under `key`, replacing any previous entry
    pub fn register<T: Any + Send + Sync>(&self, key: impl Into<String>, service: T) {
        self.register_arc(key, Arc::new(service));
    }

    /// Register an already shared service under `key`
    pub fn register_arc<T: Any + Send + Sync>(&self, key: impl Into<String>, service: Arc<T>) {
        let key = key.into();
        tracing::debug!(key = %key, service = type_name::<T>(), "Registered service");
        self.services.insert(key, service);
    }

    /// Look up a service by key
    pub fn get_service(&self, key: &str) -> LoadResult<Service> {
        self.services
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LoadError::ServiceNotFound(key.to_string()))
    }

    /// Look up a service and downcast it to its concrete type
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> LoadResult<Arc<T>> {
        downcast(key, self.get_service(key)?)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.services.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn downcast<T: Any + Send + Sync>(key: &str, service: Service) -> LoadResult<Arc<T>> {
    service.downcast::<T>().map_err(|_| LoadError::DependencyType {
        key: key.to_string(),
        expected: type_name::<T>(),
    })
}

/// Services resolved for one controller, in declaration order
#[derive(Clone, Default)]
pub struct Dependencies {
    entries: Vec<(String, Service)>,
}

impl Dependencies {
    /// Resolve `keys` against the registry, in order.
    ///
    /// Fails on the first key that is not registered.
    pub fn resolve<'a>(
        registry: &ServiceRegistry,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> LoadResult<Self> {
        let entries = keys
            .into_iter()
            .map(|key| Ok((key.to_string(), registry.get_service(key)?)))
            .collect::<LoadResult<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared keys, in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Dependency at `index`, downcast to `T`
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> LoadResult<Arc<T>> {
        let (key, service) = self
            .entries
            .get(index)
            .ok_or_else(|| LoadError::ServiceNotFound(format!("dependency #{index}")))?;
        downcast(key, service.clone())
    }

    /// Dependency declared under `key`, downcast to `T`
    pub fn by_key<T: Any + Send + Sync>(&self, key: &str) -> LoadResult<Arc<T>> {
        let (key, service) = self
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .ok_or_else(|| LoadError::ServiceNotFound(key.to_string()))?;
        downcast(key, service.clone())
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}
