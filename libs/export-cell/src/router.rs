use axum::{middleware, routing::get, Router};

use shared_storage::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers::export;

pub fn create_export_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(export))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
