use serde::Deserialize;

use patient_cell::models::PatientError;
use queue_cell::models::QueueError;
use shared_models::error::AppError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Patient(#[from] PatientError),
}

impl From<ExportError> for AppError {
    fn from(error: ExportError) -> Self {
        match error {
            ExportError::Queue(inner) => inner.into(),
            ExportError::Patient(inner) => inner.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    #[default]
    Visits,
    Patients,
}

/// A rendered export ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}
