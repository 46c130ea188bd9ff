//! Panic isolation
//!
//! Controller code (constructors, hooks, actions) runs behind `catch_unwind`
//! so a panicking controller turns into an error for that controller or that
//! request instead of tearing down the server.
//!
//! `catch_unwind` only catches unwinding panics; the crate must not be built
//! with `panic = "abort"`.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Run a synchronous call, converting a panic into an error with `on_panic`
pub fn call_safely<T, E>(call: impl FnOnce() -> Result<T, E>, on_panic: impl FnOnce(String) -> E) -> Result<T, E> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(panic_info) => {
            let msg = extract_panic_message(&panic_info);
            tracing::error!(message = %msg, "Controller code panicked");
            Err(on_panic(msg))
        }
    }
}

/// Await a future, converting a panic during any poll into an error
pub async fn call_safely_async<T, E, Fut>(fut: Fut, on_panic: impl FnOnce(String) -> E) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic_info) => {
            let msg = extract_panic_message(&panic_info);
            tracing::error!(message = %msg, "Controller code panicked during async execution");
            Err(on_panic(msg))
        }
    }
}

/// Extract a human-readable message from a panic payload
fn extract_panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic (non-string payload)".to_string()
    }
}
