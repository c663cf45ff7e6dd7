use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_models::error::AppError;
use shared_models::records::PatientRecord;
use shared_storage::StoreError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Phone number already registered to another patient")]
    DuplicatePhone,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for PatientError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(_) => PatientError::DuplicatePhone,
            other => PatientError::Storage(other.to_string()),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(error: PatientError) -> Self {
        match &error {
            PatientError::NotFound => AppError::NotFound(error.to_string()),
            PatientError::DuplicatePhone => AppError::Conflict(error.to_string()),
            PatientError::Validation(msg) => AppError::ValidationError(msg.clone()),
            PatientError::Storage(msg) => AppError::Storage(msg.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
}

/// Registry entry annotated with its ledger history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientWithStats {
    #[serde(flatten)]
    pub patient: PatientRecord,
    pub visit_count: usize,
    pub last_visit_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStats {
    pub total: usize,
    pub new_today: usize,
    pub with_visits: usize,
}

/// The full roster, newest registration first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRoster {
    pub patients: Vec<PatientWithStats>,
    pub total: usize,
    pub stats: RosterStats,
}
