//! Resolve module exports into controller classes
//!
//! A module exports either a controller class directly or a descriptor object:
//!
//! ```json
//! { "controller": "TestController", "dependencies": ["test:test"] }
//! ```
//!
//! The shape is resolved once here. Dispatch only ever sees the resulting
//! [`ResolvedController`].

use serde_json::Value;
use std::sync::Arc;

use super::class::{ClassTable, ControllerClass, LoadedController};
use crate::errors::{LoadError, LoadResult};
use crate::services::Dependencies;
use crate::state::AppState;

/// What a controller module exports
#[derive(Debug, Clone)]
pub enum ModuleExport {
    /// A controller class, constructed with the shared state only
    Class(ControllerClass),
    /// A descriptor naming a class and the services it depends on
    Descriptor(Value),
}

/// A discovered controller module
#[derive(Debug, Clone)]
pub struct ControllerModule {
    /// Module path, used for logging, rewrites and `disabled_modules`
    pub path: String,
    pub export: ModuleExport,
    /// Path of another module this one replaces
    pub rewrites: Option<String>,
}

impl ControllerModule {
    pub fn class(path: impl Into<String>, class: ControllerClass) -> Self {
        Self {
            path: path.into(),
            export: ModuleExport::Class(class),
            rewrites: None,
        }
    }

    pub fn descriptor(path: impl Into<String>, descriptor: Value) -> Self {
        Self {
            path: path.into(),
            export: ModuleExport::Descriptor(descriptor),
            rewrites: None,
        }
    }

    pub fn with_rewrites(mut self, rewrites: impl Into<String>) -> Self {
        self.rewrites = Some(rewrites.into());
        self
    }
}

/// A module whose export has been resolved to a class
#[derive(Debug, Clone)]
pub struct ResolvedController {
    pub module: String,
    pub class: ControllerClass,
    /// Service keys, in constructor order
    pub dependency_keys: Vec<String>,
}

impl ResolvedController {
    /// Resolve dependencies and run the controller's load sequence
    pub async fn instantiate(&self, state: Arc<AppState>) -> LoadResult<LoadedController> {
        let deps = Dependencies::resolve(
            &state.services,
            self.dependency_keys.iter().map(String::as_str),
        )?;
        self.class.load(state, deps).await
    }
}

/// Resolve a module export against the known controller classes.
///
/// # Errors
///
/// - [`LoadError::InvalidControllerType`] when the export is not an object, the
///   `controller` entry is not a string or names an unknown class, or a
///   dependency key is not a string
/// - [`LoadError::MissingController`] when the `controller` entry is absent
pub fn resolve(module: &ControllerModule, classes: &ClassTable) -> LoadResult<ResolvedController> {
    let descriptor = match &module.export {
        ModuleExport::Class(class) => {
            return Ok(ResolvedController {
                module: module.path.clone(),
                class: *class,
                dependency_keys: Vec::new(),
            });
        }
        ModuleExport::Descriptor(descriptor) => descriptor,
    };

    let invalid = |reason: String| LoadError::InvalidControllerType {
        module: module.path.clone(),
        reason,
    };

    let Value::Object(fields) = descriptor else {
        return Err(invalid(format!(
            "expected a controller class or descriptor object, got {}",
            json_kind(descriptor)
        )));
    };

    let class_name = match fields.get("controller") {
        None | Some(Value::Null) => return Err(LoadError::MissingController(module.path.clone())),
        Some(Value::String(name)) => name,
        Some(other) => {
            return Err(invalid(format!(
                "'controller' must name a controller class, got {}",
                json_kind(other)
            )));
        }
    };

    let class = classes
        .get(class_name)
        .ok_or_else(|| invalid(format!("unknown controller class '{class_name}'")))?;

    let dependency_keys = match fields.get("dependencies") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(keys)) => keys
            .iter()
            .map(|key| match key {
                Value::String(key) => Ok(key.clone()),
                other => Err(invalid(format!(
                    "dependency keys must be strings, got {}",
                    json_kind(other)
                ))),
            })
            .collect::<LoadResult<Vec<_>>>()?,
        Some(other) => {
            tracing::warn!(
                module = %module.path,
                dependencies = %other,
                "Controller dependencies must be an array, loading without dependencies"
            );
            Vec::new()
        }
    };

    Ok(ResolvedController {
        module: module.path.clone(),
        class,
        dependency_keys,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::controller::Controller;
    use async_trait::async_trait;
    use serde_json::json;

    struct Greeter {
        _greeting: Arc<String>,
    }

    #[async_trait]
    impl Controller for Greeter {
        fn new(_state: Arc<AppState>, deps: Dependencies) -> LoadResult<Self> {
            Ok(Greeter {
                _greeting: deps.get::<String>(0)?,
            })
        }
    }

    fn classes() -> ClassTable {
        ClassTable::new().with(ControllerClass::of::<Greeter>("Greeter"))
    }

    #[test]
    fn test_class_export_has_no_dependencies() {
        let module = ControllerModule::class("plugins/a", ControllerClass::of::<Greeter>("Greeter"));
        let resolved = resolve(&module, &classes()).unwrap();
        assert_eq!(resolved.class.name, "Greeter");
        assert!(resolved.dependency_keys.is_empty());
    }

    #[test]
    fn test_descriptor_resolves_dependencies_in_order() {
        let module = ControllerModule::descriptor(
            "plugins/a",
            json!({ "controller": "Greeter", "dependencies": ["b", "a"] }),
        );
        let resolved = resolve(&module, &classes()).unwrap();
        assert_eq!(resolved.dependency_keys, vec!["b", "a"]);
    }

    #[test]
    fn test_descriptor_without_dependencies() {
        let module = ControllerModule::descriptor("plugins/a", json!({ "controller": "Greeter" }));
        let resolved = resolve(&module, &classes()).unwrap();
        assert!(resolved.dependency_keys.is_empty());
    }

    #[test]
    fn test_non_array_dependencies_are_ignored() {
        let module = ControllerModule::descriptor(
            "plugins/a",
            json!({ "controller": "Greeter", "dependencies": "test:test" }),
        );
        let resolved = resolve(&module, &classes()).unwrap();
        assert!(resolved.dependency_keys.is_empty());
    }

    #[test]
    fn test_missing_controller() {
        let module = ControllerModule::descriptor("plugins/test/controllers/object", json!({ "dependencies": [] }));
        assert_eq!(
            resolve(&module, &classes()).unwrap_err(),
            LoadError::MissingController("plugins/test/controllers/object".to_string())
        );
    }

    #[test]
    fn test_invalid_controller_types() {
        for export in [
            json!("Greeter"),
            json!(42),
            json!({ "controller": 42 }),
            json!({ "controller": "Unknown" }),
            json!({ "controller": "Greeter", "dependencies": [1] }),
        ] {
            let module = ControllerModule::descriptor("plugins/bad", export);
            let err = resolve(&module, &classes()).unwrap_err();
            assert!(
                matches!(err, LoadError::InvalidControllerType { ref module, .. } if module == "plugins/bad"),
                "unexpected error: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_instantiate_injects_services() {
        let state = AppState::new(ServerConfig::default());
        state.services.register("test:greeting", "hello".to_string());

        let module = ControllerModule::descriptor(
            "plugins/a",
            json!({ "controller": "Greeter", "dependencies": ["test:greeting"] }),
        );
        let resolved = resolve(&module, &classes()).unwrap();
        let loaded = resolved.instantiate(state).await.unwrap();
        assert_eq!(loaded.name, "Greeter");
    }

    #[tokio::test]
    async fn test_instantiate_fails_on_missing_service() {
        let state = AppState::new(ServerConfig::default());
        let module = ControllerModule::descriptor(
            "plugins/a",
            json!({ "controller": "Greeter", "dependencies": ["test:greeting"] }),
        );
        let resolved = resolve(&module, &classes()).unwrap();
        assert_eq!(
            resolved.instantiate(state).await.unwrap_err(),
            LoadError::ServiceNotFound("test:greeting".to_string())
        );
    }
}
