use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use patient_cell::models::{CreatePatientRequest, PatientError, UpdatePatientRequest};
use patient_cell::services::PatientService;
use shared_storage::store::VisitStore;
use shared_storage::AppState;
use shared_utils::test_utils::{Fixtures, TestConfig};

fn setup() -> (PatientService, AppState) {
    let state = TestConfig::default().to_state();
    (PatientService::new(&state), state)
}

fn registration(name: &str, phone: &str) -> CreatePatientRequest {
    CreatePatientRequest {
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
        birth_date: None,
        gender: None,
        address: None,
    }
}

#[tokio::test]
async fn register_stores_the_patient() {
    let (service, _state) = setup();

    let patient = service
        .register(CreatePatientRequest {
            email: Some("ahmed.benali@example.com".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1985, 5, 15),
            gender: Some("male".to_string()),
            address: Some("123 Rue des Orangers, Casablanca".to_string()),
            ..registration("Ahmed Benali", "0555123456")
        })
        .await
        .unwrap();

    assert_eq!(patient.name, "Ahmed Benali");
    assert_eq!(patient.phone, "0555123456");
    assert_eq!(patient.birth_date, NaiveDate::from_ymd_opt(1985, 5, 15));

    let fetched = service.get(patient.id).await.unwrap();
    assert_eq!(fetched.id, patient.id);
}

#[tokio::test]
async fn second_registration_with_same_phone_is_rejected() {
    let (service, _state) = setup();

    service
        .register(registration("Ahmed Benali", "0555123456"))
        .await
        .unwrap();
    let result = service
        .register(registration("Fatima Zahra", "0555123456"))
        .await;

    assert_matches!(result, Err(PatientError::DuplicatePhone));
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let (service, _state) = setup();

    assert_matches!(
        service.register(registration("", "0555123456")).await,
        Err(PatientError::Validation(_))
    );
    assert_matches!(
        service.register(registration("Ahmed Benali", "  ")).await,
        Err(PatientError::Validation(_))
    );
}

#[tokio::test]
async fn future_birth_date_is_rejected() {
    let (service, _state) = setup();

    let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
    let result = service
        .register(CreatePatientRequest {
            birth_date: Some(tomorrow),
            ..registration("Ahmed Benali", "0555123456")
        })
        .await;

    assert_matches!(result, Err(PatientError::Validation(_)));
}

#[tokio::test]
async fn update_to_anothers_phone_is_rejected() {
    let (service, _state) = setup();

    let ahmed = service
        .register(registration("Ahmed Benali", "0555123456"))
        .await
        .unwrap();
    service
        .register(registration("Fatima Zahra", "0666789012"))
        .await
        .unwrap();

    let result = service
        .update(
            ahmed.id,
            UpdatePatientRequest {
                phone: Some("0666789012".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert_matches!(result, Err(PatientError::DuplicatePhone));
}

#[tokio::test]
async fn update_to_own_phone_is_not_a_collision() {
    let (service, _state) = setup();

    let ahmed = service
        .register(registration("Ahmed Benali", "0555123456"))
        .await
        .unwrap();

    let updated = service
        .update(
            ahmed.id,
            UpdatePatientRequest {
                phone: Some("0555123456".to_string()),
                name: Some("Ahmed B.".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.phone, "0555123456");
    assert_eq!(updated.name, "Ahmed B.");
}

#[tokio::test]
async fn update_unknown_patient_is_not_found() {
    let (service, _state) = setup();

    let result = service
        .update(
            Uuid::new_v4(),
            UpdatePatientRequest {
                name: Some("Nobody".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert_matches!(result, Err(PatientError::NotFound));
}

#[tokio::test]
async fn remove_cascades_to_every_visit() {
    let (service, state) = setup();

    let ahmed = service
        .register(registration("Ahmed Benali", "0555123456"))
        .await
        .unwrap();
    for number in 1..=3 {
        state
            .visits
            .insert_visit(Fixtures::visit(&ahmed, number))
            .await
            .unwrap();
    }

    service.remove(ahmed.id).await.unwrap();

    assert_matches!(service.get(ahmed.id).await, Err(PatientError::NotFound));
    let ledger = state.visits.list_visits(None).await.unwrap();
    assert!(
        !ledger.iter().any(|v| v.patient_id == ahmed.id),
        "cascade left visits behind"
    );
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn remove_unknown_patient_is_not_found() {
    let (service, _state) = setup();
    assert_matches!(
        service.remove(Uuid::new_v4()).await,
        Err(PatientError::NotFound)
    );
}

#[tokio::test]
async fn roster_joins_visit_stats_newest_first() {
    let (service, state) = setup();

    let ahmed = service
        .register(registration("Ahmed Benali", "0555123456"))
        .await
        .unwrap();
    let fatima = service
        .register(registration("Fatima Zahra", "0666789012"))
        .await
        .unwrap();

    let early = Fixtures::visit_at(&ahmed, 1, Utc::now() - Duration::days(2));
    let recent = Fixtures::visit_at(&ahmed, 1, Utc::now() - Duration::hours(1));
    state.visits.insert_visit(early).await.unwrap();
    state.visits.insert_visit(recent.clone()).await.unwrap();

    let roster = service.list_with_stats().await.unwrap();

    assert_eq!(roster.total, 2);
    // Most recent registration first.
    assert_eq!(roster.patients[0].patient.id, fatima.id);
    assert_eq!(roster.patients[1].patient.id, ahmed.id);

    let ahmed_row = &roster.patients[1];
    assert_eq!(ahmed_row.visit_count, 2);
    assert_eq!(ahmed_row.last_visit_date, Some(recent.created_at));

    assert_eq!(roster.stats.total, 2);
    assert_eq!(roster.stats.new_today, 2);
    assert_eq!(roster.stats.with_visits, 1);
}
