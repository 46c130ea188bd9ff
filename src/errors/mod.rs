//! Error types for controller loading and request dispatch
//!
//! Load-time failures ([`LoadError`]) are isolated to the controller or route
//! that caused them. Request-time failures ([`DispatchError`]) are always turned
//! into a response and forwarded to the router's error channel.

pub mod dispatch_error;
pub mod load_error;

pub use dispatch_error::{DispatchError, DispatchResult, ForwardedError};
pub use load_error::{LoadError, LoadResult};
