use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical patient record, source of truth for contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Consultation workflow state of a visit.
///
/// Wire form matches the ledger values: WAITING, IN_ROOM, FINISHED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Waiting,
    InRoom,
    Finished,
}

impl VisitStatus {
    /// Display label used on printed reports.
    pub fn display_label(&self) -> &'static str {
        match self {
            VisitStatus::Waiting => "En attente",
            VisitStatus::InRoom => "En consultation",
            VisitStatus::Finished => "Terminé",
        }
    }
}

/// One entry in the day's queue ledger.
///
/// `patient_name` and `patient_phone` are snapshots taken at creation time;
/// they survive the patient record going away but can drift until an explicit
/// sync propagates fresh values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub id: Uuid,
    pub queue_number: u32,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub status: VisitStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Live projection of the patient a visit points at.
///
/// Authoritative over the visit snapshot whenever the patient still resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientJoin {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

impl From<&PatientRecord> for PatientJoin {
    fn from(patient: &PatientRecord) -> Self {
        Self {
            id: patient.id,
            name: patient.name.clone(),
            phone: patient.phone.clone(),
            email: patient.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_status_wire_form_is_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&VisitStatus::InRoom).unwrap(),
            "\"IN_ROOM\""
        );
        let parsed: VisitStatus = serde_json::from_str("\"WAITING\"").unwrap();
        assert_eq!(parsed, VisitStatus::Waiting);
    }

    #[test]
    fn display_labels_are_localized() {
        assert_eq!(VisitStatus::Waiting.display_label(), "En attente");
        assert_eq!(VisitStatus::InRoom.display_label(), "En consultation");
        assert_eq!(VisitStatus::Finished.display_label(), "Terminé");
    }
}
