//! Controller module discovery
//!
//! A [`ModuleSource`] yields the controller modules to load. Modules
//! registered at link time with `register_controller!` come from
//! [`InventorySource`]; [`StaticSource`] wraps an explicit list (hosts that
//! build their module list themselves, and tests).
//!
//! [`prepare_modules`] then applies module rewrites and the
//! `controllers.disabled_modules` list.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;

use crate::controller::{ControllerClass, ControllerModule};

/// Provider of controller modules
#[async_trait]
pub trait ModuleSource: Send + Sync {
    async fn discover(&self) -> Vec<ControllerModule>;
}

/// Export of a link-time registered module
#[derive(Clone, Copy)]
pub enum StaticExport {
    Class(ControllerClass),
    Descriptor(fn() -> Value),
}

/// Module registered with `inventory::submit!`
///
/// Descriptors are produced by a function pointer so the registration stays
/// `const`.
pub struct ControllerRegistration {
    pub path: &'static str,
    pub export: StaticExport,
    pub rewrites: Option<&'static str>,
}

impl ControllerRegistration {
    pub const fn class(path: &'static str, class: ControllerClass) -> Self {
        Self {
            path,
            export: StaticExport::Class(class),
            rewrites: None,
        }
    }

    pub const fn descriptor(path: &'static str, descriptor: fn() -> Value) -> Self {
        Self {
            path,
            export: StaticExport::Descriptor(descriptor),
            rewrites: None,
        }
    }

    /// Replace the module registered at `path`
    pub const fn with_rewrites(mut self, path: &'static str) -> Self {
        self.rewrites = Some(path);
        self
    }

    fn to_module(&self) -> ControllerModule {
        let module = match self.export {
            StaticExport::Class(class) => ControllerModule::class(self.path, class),
            StaticExport::Descriptor(descriptor) => ControllerModule::descriptor(self.path, descriptor()),
        };
        match self.rewrites {
            Some(rewrites) => module.with_rewrites(rewrites),
            None => module,
        }
    }
}

inventory::collect!(ControllerRegistration);

/// Modules registered with `register_controller!`
#[derive(Debug, Clone, Copy, Default)]
pub struct InventorySource;

#[async_trait]
impl ModuleSource for InventorySource {
    async fn discover(&self) -> Vec<ControllerModule> {
        let mut modules: Vec<ControllerModule> = inventory::iter::<ControllerRegistration>
            .into_iter()
            .map(ControllerRegistration::to_module)
            .collect();
        // Link order is unspecified
        modules.sort_by(|a, b| a.path.cmp(&b.path));
        modules
    }
}

/// Fixed list of modules
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    modules: Vec<ControllerModule>,
}

impl StaticSource {
    pub fn new(modules: Vec<ControllerModule>) -> Self {
        Self { modules }
    }

    pub fn with(mut self, module: ControllerModule) -> Self {
        self.modules.push(module);
        self
    }
}

#[async_trait]
impl ModuleSource for StaticSource {
    async fn discover(&self) -> Vec<ControllerModule> {
        self.modules.clone()
    }
}

/// Apply rewrites and drop disabled modules.
///
/// A module declaring `rewrites` replaces the module at that path. Modules
/// listed in `disabled` are skipped whether or not they were rewritten.
pub fn prepare_modules(modules: Vec<ControllerModule>, disabled: &[String]) -> Vec<ControllerModule> {
    let rewritten: HashSet<String> = modules
        .iter()
        .filter_map(|m| m.rewrites.clone())
        .collect();

    modules
        .into_iter()
        .filter(|module| {
            if rewritten.contains(&module.path) {
                tracing::info!(module = %module.path, "Controller module rewritten, skipping");
                return false;
            }
            if disabled.contains(&module.path) {
                tracing::info!(module = %module.path, "Controller module disabled, skipping");
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(modules: &[ControllerModule]) -> Vec<&str> {
        modules.iter().map(|m| m.path.as_str()).collect()
    }

    #[tokio::test]
    async fn test_static_source_yields_modules() {
        let source = StaticSource::default()
            .with(ControllerModule::descriptor("a", json!({})))
            .with(ControllerModule::descriptor("b", json!({})));
        assert_eq!(paths(&source.discover().await), vec!["a", "b"]);
    }

    #[test]
    fn test_rewrite_replaces_module() {
        let modules = vec![
            ControllerModule::descriptor("plugins/test/controllers/test", json!({})),
            ControllerModule::descriptor("plugins/custom/controllers/test", json!({}))
                .with_rewrites("plugins/test/controllers/test"),
            ControllerModule::descriptor("plugins/test/controllers/other", json!({})),
        ];
        let prepared = prepare_modules(modules, &[]);
        assert_eq!(
            paths(&prepared),
            vec!["plugins/custom/controllers/test", "plugins/test/controllers/other"]
        );
    }

    #[test]
    fn test_disabled_modules_skipped() {
        let modules = vec![
            ControllerModule::descriptor("a", json!({})),
            ControllerModule::descriptor("b", json!({})),
        ];
        let prepared = prepare_modules(modules, &["a".to_string()]);
        assert_eq!(paths(&prepared), vec!["b"]);
    }
}
