use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared_models::records::{PatientRecord, VisitRecord, VisitStatus};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violation: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Half-open UTC window `[start, end)` covering one clinic-local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Partial update for a patient record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct PatientChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
}

/// Partial update for a visit record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct VisitChanges {
    pub status: Option<VisitStatus>,
    pub reason: Option<String>,
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
}

/// Read/write contract over the canonical patient registry.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Persist a new patient. Fails with [`StoreError::Conflict`] when the
    /// phone is already registered to another patient.
    async fn insert_patient(&self, patient: PatientRecord) -> StoreResult<PatientRecord>;

    /// Apply a partial update, touching `updated_at`. Returns `None` when no
    /// patient has this id. Phone uniqueness is re-checked excluding the
    /// patient itself.
    async fn update_patient(
        &self,
        id: Uuid,
        changes: PatientChanges,
    ) -> StoreResult<Option<PatientRecord>>;

    /// Remove the patient and every visit referencing it within one atomic
    /// scope. Returns `false` when no patient has this id.
    async fn delete_patient(&self, id: Uuid) -> StoreResult<bool>;

    async fn get_patient(&self, id: Uuid) -> StoreResult<Option<PatientRecord>>;

    /// All patients, most recently registered first.
    async fn list_patients(&self) -> StoreResult<Vec<PatientRecord>>;

    /// Look up the patient holding `phone`, ignoring `exclude` when given
    /// (self-updates must not collide with themselves).
    async fn find_patient_by_phone(
        &self,
        phone: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<PatientRecord>>;
}

/// Read/write contract over the day-scoped visit ledger.
#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn insert_visit(&self, visit: VisitRecord) -> StoreResult<VisitRecord>;

    /// Apply a partial update, touching `updated_at`. Returns `None` when no
    /// visit has this id.
    async fn update_visit(&self, id: Uuid, changes: VisitChanges)
        -> StoreResult<Option<VisitRecord>>;

    /// Returns `false` when no visit has this id.
    async fn delete_visit(&self, id: Uuid) -> StoreResult<bool>;

    async fn get_visit(&self, id: Uuid) -> StoreResult<Option<VisitRecord>>;

    /// Visits whose `created_at` falls inside `window`, or every visit when
    /// `window` is `None`. Ordered by creation time ascending.
    async fn list_visits(&self, window: Option<DayWindow>) -> StoreResult<Vec<VisitRecord>>;

    /// Highest queue number assigned inside `window`, 0 when the day is
    /// still empty. Callers owning sequence assignment must serialize the
    /// read-then-insert themselves (see `DayLocks`).
    async fn max_queue_number(&self, window: DayWindow) -> StoreResult<u32>;

    /// Every visit referencing `patient_id`, most recent first.
    async fn list_visits_for_patient(&self, patient_id: Uuid) -> StoreResult<Vec<VisitRecord>>;
}
