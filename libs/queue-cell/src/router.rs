use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_storage::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_queue_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_visits))
        .route("/", post(create_visit))
        .route("/{id}", patch(update_visit))
        .route("/{id}", delete(delete_visit))
        .route("/{id}/advance", post(advance_visit))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
