use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::records::PatientRecord;
use shared_storage::day::{clinic_offset, current_day, window_today};
use shared_storage::store::{PatientChanges, PatientStore, VisitStore};
use shared_storage::AppState;

use crate::models::{
    CreatePatientRequest, PatientError, PatientRoster, PatientWithStats, RosterStats,
    UpdatePatientRequest,
};

/// The patient registry: canonical contact records, phone uniqueness and the
/// cascade that keeps the ledger free of orphaned visits.
#[derive(Clone)]
pub struct PatientService {
    patients: Arc<dyn PatientStore>,
    visits: Arc<dyn VisitStore>,
    offset: FixedOffset,
}

impl PatientService {
    pub fn new(state: &AppState) -> Self {
        Self {
            patients: state.patients.clone(),
            visits: state.visits.clone(),
            offset: clinic_offset(state.config.clinic_utc_offset_minutes),
        }
    }

    pub async fn register(
        &self,
        request: CreatePatientRequest,
    ) -> Result<PatientRecord, PatientError> {
        let name = request.name.trim();
        let phone = request.phone.trim();

        if name.is_empty() {
            return Err(PatientError::Validation("name is required".to_string()));
        }
        if phone.is_empty() {
            return Err(PatientError::Validation("phone is required".to_string()));
        }
        self.check_birth_date(request.birth_date)?;

        if self
            .patients
            .find_patient_by_phone(phone, None)
            .await?
            .is_some()
        {
            warn!("Registration rejected, phone already in use");
            return Err(PatientError::DuplicatePhone);
        }

        let now = Utc::now();
        let patient = PatientRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: request.email,
            birth_date: request.birth_date,
            gender: request.gender,
            address: request.address,
            created_at: now,
            updated_at: now,
        };

        let saved = self.patients.insert_patient(patient).await?;
        info!("Patient {} registered", saved.id);
        Ok(saved)
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<PatientRecord, PatientError> {
        if matches!(&request.name, Some(name) if name.trim().is_empty()) {
            return Err(PatientError::Validation("name cannot be empty".to_string()));
        }
        if matches!(&request.phone, Some(phone) if phone.trim().is_empty()) {
            return Err(PatientError::Validation("phone cannot be empty".to_string()));
        }
        self.check_birth_date(request.birth_date)?;

        let changes = PatientChanges {
            name: request.name,
            phone: request.phone,
            email: request.email,
            birth_date: request.birth_date,
            gender: request.gender,
            address: request.address,
        };

        debug!("Updating patient {}", id);
        let updated = self
            .patients
            .update_patient(id, changes)
            .await?
            .ok_or(PatientError::NotFound)?;

        Ok(updated)
    }

    /// Remove a patient and, with it, every visit it ever had.
    pub async fn remove(&self, id: Uuid) -> Result<(), PatientError> {
        if !self.patients.delete_patient(id).await? {
            return Err(PatientError::NotFound);
        }
        info!("Patient {} removed with their visits", id);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<PatientRecord, PatientError> {
        self.patients
            .get_patient(id)
            .await?
            .ok_or(PatientError::NotFound)
    }

    /// Roster with per-patient ledger stats, newest registration first.
    pub async fn list_with_stats(&self) -> Result<PatientRoster, PatientError> {
        let records = self.patients.list_patients().await?;
        let today = window_today(self.offset);

        let mut patients = Vec::with_capacity(records.len());
        let mut stats = RosterStats {
            total: records.len(),
            ..Default::default()
        };

        for record in records {
            let visits = self.visits.list_visits_for_patient(record.id).await?;
            let last_visit_date = visits.first().map(|v| v.created_at);

            if today.contains(record.created_at) {
                stats.new_today += 1;
            }
            if !visits.is_empty() {
                stats.with_visits += 1;
            }

            patients.push(PatientWithStats {
                visit_count: visits.len(),
                last_visit_date,
                patient: record,
            });
        }

        Ok(PatientRoster {
            total: patients.len(),
            stats,
            patients,
        })
    }

    fn check_birth_date(
        &self,
        birth_date: Option<chrono::NaiveDate>,
    ) -> Result<(), PatientError> {
        if let Some(date) = birth_date {
            if date > current_day(self.offset) {
                return Err(PatientError::Validation(
                    "birth date cannot be in the future".to_string(),
                ));
            }
        }
        Ok(())
    }
}
