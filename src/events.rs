//! Controller lifecycle notifications
//!
//! A small async event bus. [`EventBus::emit`] runs every subscriber of the
//! event and waits for all of them before returning, so a subscriber can
//! prepare state (or observe a request) before the next step proceeds.

use dashmap::DashMap;
use futures::future::{BoxFuture, join_all};
use http::{HeaderMap, Method, Uri};
use std::future::Future;
use std::sync::Arc;

use crate::route::RouteInfo;

/// Emitted before the controller load pass starts
pub const BEFORE_LOAD: &str = "controller:before_load";
/// Emitted after every discovered module has been processed
pub const AFTER_LOAD: &str = "controller:after_load";
/// Emitted for each request, before the controller hooks run
pub const BEFORE_CALL_ROUTE: &str = "controller:before_call_route";

/// Request snapshot passed to `before_call_route` subscribers
#[derive(Debug, Clone)]
pub struct RouteCall {
    pub route: RouteInfo,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

/// Totals of a finished load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub controllers: usize,
    pub routes: usize,
    pub failures: usize,
}

/// Event payloads
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    BeforeLoad,
    AfterLoad(LoadSummary),
    BeforeCallRoute(RouteCall),
}

impl ControllerEvent {
    /// Name subscribers bind to
    pub fn name(&self) -> &'static str {
        match self {
            ControllerEvent::BeforeLoad => BEFORE_LOAD,
            ControllerEvent::AfterLoad(_) => AFTER_LOAD,
            ControllerEvent::BeforeCallRoute(_) => BEFORE_CALL_ROUTE,
        }
    }
}

/// Subscriber callback
pub type EventHandlerFn =
    Arc<dyn Fn(Arc<ControllerEvent>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Async notification bus
#[derive(Default)]
pub struct EventBus {
    handlers: DashMap<String, Vec<EventHandlerFn>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an event by name
    pub fn on<F, Fut>(&self, event: &str, handler: F)
    where
        F: Fn(Arc<ControllerEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: EventHandlerFn = Arc::new(
            move |event: Arc<ControllerEvent>| -> BoxFuture<'static, ()> { Box::pin(handler(event)) },
        );
        self.handlers
            .entry(event.to_string())
            .or_default()
            .push(handler);
        tracing::debug!(event = %event, "Subscribed event handler");
    }

    /// Emit an event and wait for every subscriber
    pub async fn emit(&self, event: ControllerEvent) {
        let handlers = match self.handlers.get(event.name()) {
            Some(entry) => entry.value().clone(),
            None => return,
        };

        let event = Arc::new(event);
        join_all(handlers.iter().map(|handler| handler(event.clone()))).await;
    }

    /// Number of subscribers for an event
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.handlers.get(event).map(|h| h.len()).unwrap_or(0)
    }
}
