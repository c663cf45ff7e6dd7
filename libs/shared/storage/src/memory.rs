//! In-process store used when no REST backend is configured, and as the
//! substrate for service-level tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::records::{PatientRecord, VisitRecord};

use crate::store::{
    DayWindow, PatientChanges, PatientStore, StoreError, StoreResult, VisitChanges, VisitStore,
};

#[derive(Default)]
pub struct MemoryStore {
    patients: RwLock<HashMap<Uuid, PatientRecord>>,
    visits: RwLock<HashMap<Uuid, VisitRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn phone_conflict(phone: &str) -> StoreError {
    StoreError::Conflict(format!("phone {} already registered", phone))
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn insert_patient(&self, patient: PatientRecord) -> StoreResult<PatientRecord> {
        let mut patients = self.patients.write().await;

        if patients.values().any(|p| p.phone == patient.phone) {
            return Err(phone_conflict(&patient.phone));
        }

        patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn update_patient(
        &self,
        id: Uuid,
        changes: PatientChanges,
    ) -> StoreResult<Option<PatientRecord>> {
        let mut patients = self.patients.write().await;

        if !patients.contains_key(&id) {
            return Ok(None);
        }

        if let Some(phone) = &changes.phone {
            if patients.values().any(|p| p.id != id && &p.phone == phone) {
                return Err(phone_conflict(phone));
            }
        }

        let patient = patients.get_mut(&id).ok_or_else(|| {
            StoreError::Backend("patient vanished during update".to_string())
        })?;

        if let Some(name) = changes.name {
            patient.name = name;
        }
        if let Some(phone) = changes.phone {
            patient.phone = phone;
        }
        if let Some(email) = changes.email {
            patient.email = Some(email);
        }
        if let Some(birth_date) = changes.birth_date {
            patient.birth_date = Some(birth_date);
        }
        if let Some(gender) = changes.gender {
            patient.gender = Some(gender);
        }
        if let Some(address) = changes.address {
            patient.address = Some(address);
        }
        patient.updated_at = Utc::now();

        Ok(Some(patient.clone()))
    }

    async fn delete_patient(&self, id: Uuid) -> StoreResult<bool> {
        // Both maps locked for the whole cascade so no reader can observe a
        // visit pointing at a half-deleted patient.
        let mut patients = self.patients.write().await;
        let mut visits = self.visits.write().await;

        if patients.remove(&id).is_none() {
            return Ok(false);
        }

        visits.retain(|_, visit| visit.patient_id != id);
        Ok(true)
    }

    async fn get_patient(&self, id: Uuid) -> StoreResult<Option<PatientRecord>> {
        Ok(self.patients.read().await.get(&id).cloned())
    }

    async fn list_patients(&self) -> StoreResult<Vec<PatientRecord>> {
        let mut patients: Vec<_> = self.patients.read().await.values().cloned().collect();
        patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(patients)
    }

    async fn find_patient_by_phone(
        &self,
        phone: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<PatientRecord>> {
        let patients = self.patients.read().await;
        Ok(patients
            .values()
            .find(|p| p.phone == phone && exclude.map_or(true, |ex| p.id != ex))
            .cloned())
    }
}

#[async_trait]
impl VisitStore for MemoryStore {
    async fn insert_visit(&self, visit: VisitRecord) -> StoreResult<VisitRecord> {
        self.visits.write().await.insert(visit.id, visit.clone());
        Ok(visit)
    }

    async fn update_visit(
        &self,
        id: Uuid,
        changes: VisitChanges,
    ) -> StoreResult<Option<VisitRecord>> {
        let mut visits = self.visits.write().await;

        let Some(visit) = visits.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(status) = changes.status {
            visit.status = status;
        }
        if let Some(reason) = changes.reason {
            visit.reason = Some(reason);
        }
        if let Some(patient_name) = changes.patient_name {
            visit.patient_name = patient_name;
        }
        if let Some(patient_phone) = changes.patient_phone {
            visit.patient_phone = patient_phone;
        }
        visit.updated_at = Utc::now();

        Ok(Some(visit.clone()))
    }

    async fn delete_visit(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.visits.write().await.remove(&id).is_some())
    }

    async fn get_visit(&self, id: Uuid) -> StoreResult<Option<VisitRecord>> {
        Ok(self.visits.read().await.get(&id).cloned())
    }

    async fn list_visits(&self, window: Option<DayWindow>) -> StoreResult<Vec<VisitRecord>> {
        let visits = self.visits.read().await;
        let mut selected: Vec<_> = visits
            .values()
            .filter(|v| window.map_or(true, |w| w.contains(v.created_at)))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(selected)
    }

    async fn max_queue_number(&self, window: DayWindow) -> StoreResult<u32> {
        let visits = self.visits.read().await;
        Ok(visits
            .values()
            .filter(|v| window.contains(v.created_at))
            .map(|v| v.queue_number)
            .max()
            .unwrap_or(0))
    }

    async fn list_visits_for_patient(&self, patient_id: Uuid) -> StoreResult<Vec<VisitRecord>> {
        let visits = self.visits.read().await;
        let mut selected: Vec<_> = visits
            .values()
            .filter(|v| v.patient_id == patient_id)
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(selected)
    }
}
