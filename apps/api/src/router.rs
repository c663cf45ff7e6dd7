use axum::{routing::get, Router};

use export_cell::router::create_export_router;
use patient_cell::router::create_patient_router;
use queue_cell::router::create_queue_router;
use shared_storage::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic queue API is running!" }))
        .nest("/patients", create_patient_router(state.clone()))
        .nest("/visits", create_queue_router(state.clone()))
        .nest("/export", create_export_router(state))
}
