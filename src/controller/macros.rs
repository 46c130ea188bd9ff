//! Controller registration macros
//!
//! Thin wrappers over `inventory::submit!`. Registered modules and classes
//! are picked up by [`InventorySource`](crate::discovery::InventorySource) and
//! [`ClassTable::from_inventory`](crate::controller::ClassTable::from_inventory).
//!
//! # Example
//!
//! ```ignore
//! use waav_controllers::{register_controller, register_controller_class};
//!
//! // Module exporting a class directly
//! register_controller!("plugins/test/controllers/test", class: TestController);
//!
//! // Module replacing another plugin's controller
//! register_controller!(
//!     "plugins/custom/controllers/test",
//!     class: CustomTestController,
//!     rewrites: "plugins/test/controllers/test"
//! );
//!
//! // Module exporting a descriptor with dependencies
//! fn test_object() -> serde_json::Value {
//!     serde_json::json!({ "controller": "TestController", "dependencies": ["test:test"] })
//! }
//! register_controller_class!(TestController);
//! register_controller!("plugins/test/controllers/object", descriptor: test_object);
//! ```

/// Register a controller module.
///
/// # Forms
///
/// * `register_controller!($path, class: $ty)` - module exporting `$ty`
/// * `register_controller!($path, class: $ty, rewrites: $other)` - same, replacing module `$other`
/// * `register_controller!($path, descriptor: $fn)` - module exporting the
///   descriptor returned by `$fn: fn() -> serde_json::Value`
#[macro_export]
macro_rules! register_controller {
    ($path:expr, class: $ty:ty) => {
        $crate::inventory::submit! {
            $crate::discovery::ControllerRegistration::class(
                $path,
                $crate::controller::ControllerClass::of::<$ty>(stringify!($ty)),
            )
        }
    };
    ($path:expr, class: $ty:ty, rewrites: $rewrites:expr) => {
        $crate::inventory::submit! {
            $crate::discovery::ControllerRegistration::class(
                $path,
                $crate::controller::ControllerClass::of::<$ty>(stringify!($ty)),
            )
            .with_rewrites($rewrites)
        }
    };
    ($path:expr, descriptor: $descriptor_fn:expr) => {
        $crate::inventory::submit! {
            $crate::discovery::ControllerRegistration::descriptor($path, $descriptor_fn)
        }
    };
}

/// Register a controller class so module descriptors can name it.
///
/// The class name defaults to the type as written; pass a second argument to
/// register it under another name.
#[macro_export]
macro_rules! register_controller_class {
    ($ty:ty) => {
        $crate::inventory::submit! {
            $crate::controller::ControllerClass::of::<$ty>(stringify!($ty))
        }
    };
    ($ty:ty, $name:expr) => {
        $crate::inventory::submit! {
            $crate::controller::ControllerClass::of::<$ty>($name)
        }
    };
}
