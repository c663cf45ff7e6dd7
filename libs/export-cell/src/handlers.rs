use axum::{
    extract::{Extension, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;

use shared_models::auth::Admin;
use shared_models::error::AppError;
use shared_storage::AppState;

use crate::models::ExportKind;
use crate::services::ExportService;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(rename = "type")]
    pub kind: Option<ExportKind>,
    pub date: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn export(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let service = ExportService::new(&state);

    let csv = service
        .export(query.kind.unwrap_or_default(), query.date)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", csv.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv.content,
    )
        .into_response())
}
