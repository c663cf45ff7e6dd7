use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::records::{PatientJoin, VisitRecord, VisitStatus};
use shared_storage::day::{clinic_offset, day_window};
use shared_storage::store::{PatientChanges, PatientStore, StoreError, VisitChanges, VisitStore};
use shared_storage::{AppState, DayLocks};

use crate::models::{
    AdvanceVisitRequest, CreateVisitRequest, EnrichedVisit, QueueBoard, QueueError, QueueStats,
    UpdateVisitRequest,
};
use crate::services::lifecycle::VisitLifecycleService;

/// The queue engine: assigns day-scoped queue numbers, walks visits through
/// the consultation workflow and keeps visit snapshots in step with the
/// patient registry.
#[derive(Clone)]
pub struct QueueService {
    patients: Arc<dyn PatientStore>,
    visits: Arc<dyn VisitStore>,
    day_locks: DayLocks,
    offset: FixedOffset,
    lifecycle: VisitLifecycleService,
}

impl QueueService {
    pub fn new(state: &AppState) -> Self {
        Self {
            patients: state.patients.clone(),
            visits: state.visits.clone(),
            day_locks: state.day_locks.clone(),
            offset: clinic_offset(state.config.clinic_utc_offset_minutes),
            lifecycle: VisitLifecycleService::new(),
        }
    }

    /// Add a patient to today's queue.
    ///
    /// The max-read and the insert run under the day's mutex; nothing else
    /// may mint queue numbers, so numbers for one day are contiguous from 1
    /// even under concurrent calls.
    pub async fn enqueue(&self, request: CreateVisitRequest) -> Result<EnrichedVisit, QueueError> {
        debug!("Enqueueing patient {}", request.patient_id);

        let patient = self
            .patients
            .get_patient(request.patient_id)
            .await?
            .ok_or(QueueError::PatientNotFound)?;

        let now = Utc::now();
        let day = now.with_timezone(&self.offset).date_naive();
        let window = day_window(day, self.offset);

        let day_lock = self.day_locks.for_day(day);
        let _guard = day_lock.lock().await;

        let queue_number = self.visits.max_queue_number(window).await? + 1;

        let visit = VisitRecord {
            id: Uuid::new_v4(),
            queue_number,
            patient_id: patient.id,
            patient_name: patient.name.clone(),
            patient_phone: patient.phone.clone(),
            status: VisitStatus::Waiting,
            reason: request.reason,
            created_at: now,
            updated_at: now,
        };

        let saved = self.visits.insert_visit(visit).await?;
        info!(
            "Visit {} enqueued as number {} on {}",
            saved.id, saved.queue_number, day
        );

        Ok(EnrichedVisit {
            patient: Some(PatientJoin::from(&patient)),
            visit: saved,
        })
    }

    /// Move a visit to its unique successor state.
    ///
    /// A finished visit has no successor: with a replacement reason the call
    /// degrades to a reason-only write, without one it is rejected.
    pub async fn advance(
        &self,
        visit_id: Uuid,
        request: AdvanceVisitRequest,
    ) -> Result<EnrichedVisit, QueueError> {
        // Status is re-read here, immediately before the write, so a stale
        // caller advances from the state the visit is actually in.
        let visit = self
            .visits
            .get_visit(visit_id)
            .await?
            .ok_or(QueueError::VisitNotFound)?;

        let mut changes = VisitChanges {
            reason: request.reason,
            ..Default::default()
        };

        match self.lifecycle.next_status(visit.status) {
            Some(next) => {
                debug!(
                    "Advancing visit {} from {:?} to {:?}",
                    visit_id, visit.status, next
                );
                changes.status = Some(next);
            }
            None if changes.reason.is_some() => {
                debug!("Visit {} already finished, updating reason only", visit_id);
            }
            None => {
                warn!("Advance rejected for finished visit {}", visit_id);
                return Err(QueueError::InvalidTransition { from: visit.status });
            }
        }

        let updated = self
            .visits
            .update_visit(visit_id, changes)
            .await?
            .ok_or(QueueError::VisitNotFound)?;

        self.enrich(updated).await
    }

    /// Apply a visit update, propagating patient fields to the registry.
    ///
    /// Name and phone edits rewrite the canonical patient record first and
    /// are then mirrored into the visit's snapshot; email lives only on the
    /// patient. When the patient no longer resolves the patient-bound fields
    /// are dropped and only the visit's own fields change.
    pub async fn sync_patient_snapshot(
        &self,
        visit_id: Uuid,
        request: UpdateVisitRequest,
    ) -> Result<EnrichedVisit, QueueError> {
        let visit = self
            .visits
            .get_visit(visit_id)
            .await?
            .ok_or(QueueError::VisitNotFound)?;

        let mut visit_changes = VisitChanges {
            reason: request.reason,
            ..Default::default()
        };

        let wants_patient_edit = request.patient_name.is_some()
            || request.patient_phone.is_some()
            || request.patient_email.is_some();

        if wants_patient_edit {
            if let Some(patient) = self.patients.get_patient(visit.patient_id).await? {
                let patient_changes = PatientChanges {
                    name: request.patient_name.clone(),
                    phone: request.patient_phone.clone(),
                    email: request.patient_email,
                    ..Default::default()
                };

                match self.patients.update_patient(patient.id, patient_changes).await {
                    Ok(Some(_)) => {
                        visit_changes.patient_name = request.patient_name;
                        visit_changes.patient_phone = request.patient_phone;
                    }
                    // Patient deleted between the read and the write: the
                    // snapshot keeps its last known values.
                    Ok(None) => {}
                    Err(StoreError::Conflict(_)) => return Err(QueueError::DuplicatePhone),
                    Err(other) => return Err(other.into()),
                }
            }
        }

        let updated = self
            .visits
            .update_visit(visit_id, visit_changes)
            .await?
            .ok_or(QueueError::VisitNotFound)?;

        self.enrich(updated).await
    }

    pub async fn remove(&self, visit_id: Uuid) -> Result<(), QueueError> {
        if !self.visits.delete_visit(visit_id).await? {
            return Err(QueueError::VisitNotFound);
        }
        info!("Visit {} removed", visit_id);
        Ok(())
    }

    /// The board for one clinic day, or the full ledger when `date` is
    /// omitted. Board order: waiting, in consultation, finished; queue number
    /// within each group.
    pub async fn list_for_day(&self, date: Option<NaiveDate>) -> Result<QueueBoard, QueueError> {
        let window = date.map(|d| day_window(d, self.offset));
        let records = self.visits.list_visits(window).await?;
        let stats = QueueStats::tally(&records);

        let mut visits = Vec::with_capacity(records.len());
        for record in records {
            visits.push(self.enrich(record).await?);
        }

        visits.sort_by_key(|v| (self.lifecycle.board_rank(v.visit.status), v.visit.queue_number));

        Ok(QueueBoard {
            total: visits.len(),
            stats,
            visits,
        })
    }

    /// Day tallies without the join work of a full board.
    pub async fn stats_for_day(&self, date: Option<NaiveDate>) -> Result<QueueStats, QueueError> {
        let window = date.map(|d| day_window(d, self.offset));
        let records = self.visits.list_visits(window).await?;
        Ok(QueueStats::tally(&records))
    }

    async fn enrich(&self, visit: VisitRecord) -> Result<EnrichedVisit, QueueError> {
        let patient = self.patients.get_patient(visit.patient_id).await?;
        Ok(EnrichedVisit {
            patient: patient.as_ref().map(PatientJoin::from),
            visit,
        })
    }
}
