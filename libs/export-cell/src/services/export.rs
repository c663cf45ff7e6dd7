use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::debug;

use patient_cell::services::PatientService;
use queue_cell::services::QueueService;
use shared_storage::day::{clinic_offset, current_day};
use shared_storage::AppState;

use crate::models::{CsvExport, ExportError, ExportKind};

const VISITS_HEADER: &str = "N° File,Patient,Téléphone,Email,Statut,Raison,Heure,Date";
const PATIENTS_HEADER: &str = "Nom,Téléphone,Email,Date de naissance,Genre,Adresse,\
Nombre de visites,Dernière visite,Date d'inscription";

/// Renders queue and roster data as CSV attachments for the front desk.
#[derive(Clone)]
pub struct ExportService {
    queue: QueueService,
    patients: PatientService,
    offset: FixedOffset,
}

impl ExportService {
    pub fn new(state: &AppState) -> Self {
        Self {
            queue: QueueService::new(state),
            patients: PatientService::new(state),
            offset: clinic_offset(state.config.clinic_utc_offset_minutes),
        }
    }

    pub async fn export(
        &self,
        kind: ExportKind,
        date: Option<NaiveDate>,
    ) -> Result<CsvExport, ExportError> {
        match kind {
            ExportKind::Visits => self.export_visits(date).await,
            ExportKind::Patients => self.export_patients().await,
        }
    }

    /// One clinic day of visits, in queue order, defaulting to today.
    pub async fn export_visits(&self, date: Option<NaiveDate>) -> Result<CsvExport, ExportError> {
        let day = date.unwrap_or_else(|| current_day(self.offset));
        debug!("Exporting visits for {}", day);

        let board = self.queue.list_for_day(Some(day)).await?;
        let mut entries = board.visits;
        entries.sort_by_key(|v| v.visit.queue_number);

        let mut lines = vec![VISITS_HEADER.to_string()];
        for entry in &entries {
            // Live join wins for display; the snapshot covers a patient
            // that no longer resolves.
            let join = entry.patient.as_ref();
            let name = join.map_or(entry.visit.patient_name.as_str(), |p| p.name.as_str());
            let phone = join.map_or(entry.visit.patient_phone.as_str(), |p| p.phone.as_str());
            let email = join.and_then(|p| p.email.as_deref()).unwrap_or("");

            lines.push(csv_row(&[
                &entry.visit.queue_number.to_string(),
                name,
                phone,
                email,
                entry.visit.status.display_label(),
                entry.visit.reason.as_deref().unwrap_or(""),
                &self.local_time(entry.visit.created_at),
                &self.local_date(entry.visit.created_at),
            ]));
        }

        Ok(CsvExport {
            filename: format!("visites-{}.csv", day.format("%Y-%m-%d")),
            content: lines.join("\n"),
        })
    }

    /// The whole roster with visit counts, newest registration first.
    pub async fn export_patients(&self) -> Result<CsvExport, ExportError> {
        debug!("Exporting patient roster");

        let roster = self.patients.list_with_stats().await?;

        let mut lines = vec![PATIENTS_HEADER.to_string()];
        for row in &roster.patients {
            let birth_date = row
                .patient
                .birth_date
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_default();
            let last_visit = row
                .last_visit_date
                .map(|at| self.local_date(at))
                .unwrap_or_default();

            lines.push(csv_row(&[
                &row.patient.name,
                &row.patient.phone,
                row.patient.email.as_deref().unwrap_or(""),
                &birth_date,
                row.patient.gender.as_deref().unwrap_or(""),
                row.patient.address.as_deref().unwrap_or(""),
                &row.visit_count.to_string(),
                &last_visit,
                &self.local_date(row.patient.created_at),
            ]));
        }

        Ok(CsvExport {
            filename: "patients.csv".to_string(),
            content: lines.join("\n"),
        })
    }

    fn local_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format("%H:%M:%S").to_string()
    }

    fn local_date(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format("%d/%m/%Y").to_string()
    }
}

fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

// Every field quoted; embedded quotes double per RFC 4180.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_quoted_and_escaped() {
        assert_eq!(csv_field("plain"), "\"plain\"");
        assert_eq!(csv_field("say \"ah\""), "\"say \"\"ah\"\"\"");
        assert_eq!(
            csv_row(&["1", "Ahmed Benali", ""]),
            "\"1\",\"Ahmed Benali\",\"\""
        );
    }
}
