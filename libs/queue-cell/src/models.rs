use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::records::{PatientJoin, VisitRecord, VisitStatus};
use shared_storage::StoreError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("Patient not found")]
    PatientNotFound,

    #[error("Visit not found")]
    VisitNotFound,

    #[error("No transition allowed from {from:?}")]
    InvalidTransition { from: VisitStatus },

    #[error("Phone number already registered to another patient")]
    DuplicatePhone,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for QueueError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(_) => QueueError::DuplicatePhone,
            other => QueueError::Storage(other.to_string()),
        }
    }
}

impl From<QueueError> for AppError {
    fn from(error: QueueError) -> Self {
        match &error {
            QueueError::PatientNotFound | QueueError::VisitNotFound => {
                AppError::NotFound(error.to_string())
            }
            QueueError::InvalidTransition { .. } | QueueError::DuplicatePhone => {
                AppError::Conflict(error.to_string())
            }
            QueueError::Validation(msg) => AppError::ValidationError(msg.clone()),
            QueueError::Storage(msg) => AppError::Storage(msg.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitRequest {
    pub patient_id: Uuid,
    pub reason: Option<String>,
}

/// Reason replacement carried by an advance request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvanceVisitRequest {
    pub reason: Option<String>,
}

/// Visit update. Patient fields here are a deliberate back door: editing them
/// through a visit rewrites the canonical patient record and mirrors
/// name/phone into the visit snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisitRequest {
    pub reason: Option<String>,
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub patient_email: Option<String>,
}

/// Ledger entry plus the live patient join when it still resolves. The join
/// is authoritative for display; the snapshot inside `visit` is the fallback.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedVisit {
    #[serde(flatten)]
    pub visit: VisitRecord,
    pub patient: Option<PatientJoin>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total: usize,
    pub waiting: usize,
    pub in_room: usize,
    pub finished: usize,
}

impl QueueStats {
    pub fn tally<'a, I>(visits: I) -> Self
    where
        I: IntoIterator<Item = &'a VisitRecord>,
    {
        let mut stats = Self::default();
        for visit in visits {
            stats.total += 1;
            match visit.status {
                VisitStatus::Waiting => stats.waiting += 1,
                VisitStatus::InRoom => stats.in_room += 1,
                VisitStatus::Finished => stats.finished += 1,
            }
        }
        stats
    }
}

/// The day board: every visit in board order plus the day's tallies.
#[derive(Debug, Clone, Serialize)]
pub struct QueueBoard {
    pub visits: Vec<EnrichedVisit>,
    pub total: usize,
    pub stats: QueueStats,
}
