//! Health check controller
//!
//! `GET /health` reports the loaded controller totals once the load pass has
//! finished. The binary registers it as `builtin/controllers/health`.

use axum::Json;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use crate::controller::Controller;
use crate::errors::{LoadError, LoadResult};
use crate::events::{AFTER_LOAD, ControllerEvent, LoadSummary};
use crate::route::{Action, RouteDescriptor, RouteTable};
use crate::services::Dependencies;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    controllers: usize,
    routes: usize,
    failures: usize,
}

/// Service key of the shared load summary slot
const SUMMARY_KEY: &str = "controllers:load_summary";

type SummarySlot = RwLock<Option<LoadSummary>>;

pub struct HealthController {
    summary: Arc<SummarySlot>,
}

/// Slot shared by every instance; the `after_load` subscriber is added once
/// per `AppState`
fn summary_slot(state: &AppState) -> LoadResult<Arc<SummarySlot>> {
    match state.services.get::<SummarySlot>(SUMMARY_KEY) {
        Ok(slot) => return Ok(slot),
        Err(LoadError::ServiceNotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let slot: Arc<SummarySlot> = Arc::new(RwLock::new(None));
    state.services.register_arc(SUMMARY_KEY, slot.clone());

    let target = slot.clone();
    state.events.on(AFTER_LOAD, move |event| {
        let target = target.clone();
        async move {
            if let ControllerEvent::AfterLoad(summary) = event.as_ref() {
                *target.write() = Some(*summary);
            }
        }
    });
    Ok(slot)
}

#[async_trait::async_trait]
impl Controller for HealthController {
    fn new(state: Arc<AppState>, _deps: Dependencies) -> LoadResult<Self> {
        Ok(Self {
            summary: summary_slot(&state)?,
        })
    }

    async fn init(&mut self, routes: &mut RouteTable<Self>) -> LoadResult<()> {
        routes.add_route(RouteDescriptor::new(
            "/health",
            Action::new(|this: Arc<Self>, _req| async move {
                let summary = (*this.summary.read()).unwrap_or_default();
                let status = if summary.failures == 0 { "ok" } else { "degraded" };
                Ok(Json(HealthResponse {
                    status,
                    controllers: summary.controllers,
                    routes: summary.routes,
                    failures: summary.failures,
                }))
            }),
        ))
    }
}
