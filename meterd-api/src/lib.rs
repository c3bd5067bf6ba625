//! meterd-api library - utility-meter reading service
//!
//! Records meter readings submitted with a photo, extracts the numeric
//! value via the Gemini API, enforces one reading per customer, type and
//! calendar month, and supports a one-time human confirmation per reading.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod engine;
pub mod extraction;
pub mod query;
pub mod store;

use engine::MeasurementEngine;
use query::QueryService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle engine; the only writer to the store
    pub engine: Arc<MeasurementEngine>,
    /// Read-only listing service
    pub query: Arc<QueryService>,
    /// Base URL used to fabricate image URLs in responses
    pub image_base_url: Arc<str>,
}

impl AppState {
    pub fn new(engine: MeasurementEngine, query: QueryService, image_base_url: &str) -> Self {
        Self {
            engine: Arc::new(engine),
            query: Arc::new(query),
            image_base_url: Arc::from(image_base_url),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, patch, post};

    Router::new()
        .route("/upload", post(api::upload_measurement))
        .route("/confirm", patch(api::confirm_measurement))
        .route("/:customer_code/list", get(api::list_measurements))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
