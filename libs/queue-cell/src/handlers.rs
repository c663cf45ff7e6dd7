use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Admin;
use shared_models::error::AppError;
use shared_storage::AppState;

use crate::models::{AdvanceVisitRequest, CreateVisitRequest, UpdateVisitRequest};
use crate::services::QueueService;

#[derive(Debug, Deserialize)]
pub struct VisitListQuery {
    pub date: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn list_visits(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Query(query): Query<VisitListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = QueueService::new(&state);

    let board = service.list_for_day(query.date).await?;

    Ok(Json(json!(board)))
}

#[axum::debug_handler]
pub async fn create_visit(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Json(request): Json<CreateVisitRequest>,
) -> Result<Json<Value>, AppError> {
    let service = QueueService::new(&state);

    let visit = service.enqueue(request).await?;

    Ok(Json(json!({ "visit": visit })))
}

#[axum::debug_handler]
pub async fn advance_visit(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Path(visit_id): Path<Uuid>,
    body: Option<Json<AdvanceVisitRequest>>,
) -> Result<Json<Value>, AppError> {
    let service = QueueService::new(&state);

    let Json(request) = body.unwrap_or_default();
    let visit = service.advance(visit_id, request).await?;

    Ok(Json(json!({ "visit": visit })))
}

#[axum::debug_handler]
pub async fn update_visit(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Path(visit_id): Path<Uuid>,
    Json(request): Json<UpdateVisitRequest>,
) -> Result<Json<Value>, AppError> {
    let service = QueueService::new(&state);

    let visit = service.sync_patient_snapshot(visit_id, request).await?;

    Ok(Json(json!({ "visit": visit })))
}

#[axum::debug_handler]
pub async fn delete_visit(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Path(visit_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = QueueService::new(&state);

    service.remove(visit_id).await?;

    Ok(Json(json!({ "success": true })))
}
