use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Admin;
use shared_models::error::AppError;
use shared_storage::AppState;

use crate::models::{CreatePatientRequest, UpdatePatientRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);

    let roster = service.list_with_stats().await?;

    Ok(Json(json!(roster)))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);

    let patient = service.register(request).await?;

    Ok(Json(json!({ "patient": patient })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);

    let patient = service.get(patient_id).await?;

    Ok(Json(json!({ "patient": patient })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);

    let patient = service.update(patient_id, request).await?;

    Ok(Json(json!({ "patient": patient })))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);

    service.remove(patient_id).await?;

    Ok(Json(json!({ "success": true })))
}
