use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_storage::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_patient_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_patients))
        .route("/", post(create_patient))
        .route("/{id}", get(get_patient))
        .route("/{id}", patch(update_patient))
        .route("/{id}", delete(delete_patient))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
