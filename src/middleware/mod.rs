pub mod params;

// Re-export middleware functions
pub use params::{Params, RequestParams, html_encode, param_middleware, sanitize_value};
