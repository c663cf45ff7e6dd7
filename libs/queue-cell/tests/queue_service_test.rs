use std::collections::BTreeSet;

use assert_matches::assert_matches;
use chrono::{NaiveDate, TimeZone, Utc};
use futures::future::join_all;
use uuid::Uuid;

use queue_cell::models::{AdvanceVisitRequest, CreateVisitRequest, QueueError, UpdateVisitRequest};
use queue_cell::services::QueueService;
use shared_models::records::{PatientRecord, VisitStatus};
use shared_storage::store::{PatientChanges, PatientStore, VisitStore};
use shared_storage::AppState;
use shared_utils::test_utils::{Fixtures, TestConfig};

fn setup() -> (QueueService, AppState) {
    let state = TestConfig::default().to_state();
    (QueueService::new(&state), state)
}

async fn seed_patient(state: &AppState, name: &str, phone: &str) -> PatientRecord {
    state
        .patients
        .insert_patient(Fixtures::patient(name, phone))
        .await
        .expect("failed to seed patient")
}

fn enqueue_request(patient: &PatientRecord) -> CreateVisitRequest {
    CreateVisitRequest {
        patient_id: patient.id,
        reason: None,
    }
}

#[tokio::test]
async fn enqueue_assigns_sequential_numbers_within_the_day() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;

    let first = service.enqueue(enqueue_request(&patient)).await.unwrap();
    let second = service.enqueue(enqueue_request(&patient)).await.unwrap();

    assert_eq!(first.visit.queue_number, 1);
    assert_eq!(second.visit.queue_number, 2);
    assert_eq!(first.visit.status, VisitStatus::Waiting);
    assert_eq!(first.visit.patient_name, "Ahmed Benali");
    assert_eq!(first.visit.patient_phone, "0555123456");

    let join = first.patient.expect("live join should resolve");
    assert_eq!(join.id, patient.id);
}

#[tokio::test]
async fn enqueue_unknown_patient_fails_and_writes_nothing() {
    let (service, state) = setup();

    let result = service
        .enqueue(CreateVisitRequest {
            patient_id: Uuid::new_v4(),
            reason: None,
        })
        .await;

    assert_matches!(result, Err(QueueError::PatientNotFound));

    let ledger = state.visits.list_visits(None).await.unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn concurrent_enqueues_mint_contiguous_numbers() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;

    const CALLERS: u32 = 16;

    let tasks: Vec<_> = (0..CALLERS)
        .map(|_| {
            let service = service.clone();
            let request = enqueue_request(&patient);
            tokio::spawn(async move { service.enqueue(request).await })
        })
        .collect();

    let mut numbers = BTreeSet::new();
    for outcome in join_all(tasks).await {
        let visit = outcome.expect("task panicked").expect("enqueue failed");
        numbers.insert(visit.visit.queue_number);
    }

    let expected: BTreeSet<u32> = (1..=CALLERS).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn advance_walks_the_workflow_forward() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;
    let visit = service.enqueue(enqueue_request(&patient)).await.unwrap();

    let in_room = service
        .advance(visit.visit.id, AdvanceVisitRequest::default())
        .await
        .unwrap();
    assert_eq!(in_room.visit.status, VisitStatus::InRoom);

    let finished = service
        .advance(visit.visit.id, AdvanceVisitRequest::default())
        .await
        .unwrap();
    assert_eq!(finished.visit.status, VisitStatus::Finished);
}

#[tokio::test]
async fn advance_from_finished_is_rejected_without_a_reason() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;
    let visit = service.enqueue(enqueue_request(&patient)).await.unwrap();

    service
        .advance(visit.visit.id, AdvanceVisitRequest::default())
        .await
        .unwrap();
    service
        .advance(visit.visit.id, AdvanceVisitRequest::default())
        .await
        .unwrap();

    let rejected = service
        .advance(visit.visit.id, AdvanceVisitRequest::default())
        .await;
    assert_matches!(
        rejected,
        Err(QueueError::InvalidTransition {
            from: VisitStatus::Finished
        })
    );

    let stored = state.visits.get_visit(visit.visit.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VisitStatus::Finished);
}

#[tokio::test]
async fn advance_from_finished_with_reason_updates_reason_only() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;
    let visit = service.enqueue(enqueue_request(&patient)).await.unwrap();

    for _ in 0..2 {
        service
            .advance(visit.visit.id, AdvanceVisitRequest::default())
            .await
            .unwrap();
    }

    let updated = service
        .advance(
            visit.visit.id,
            AdvanceVisitRequest {
                reason: Some("Contrôle".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.visit.status, VisitStatus::Finished);
    assert_eq!(updated.visit.reason.as_deref(), Some("Contrôle"));
}

#[tokio::test]
async fn stats_track_the_day_scenario() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;

    let first = service.enqueue(enqueue_request(&patient)).await.unwrap();
    let second = service.enqueue(enqueue_request(&patient)).await.unwrap();
    assert_eq!(
        (first.visit.queue_number, second.visit.queue_number),
        (1, 2)
    );

    service
        .advance(first.visit.id, AdvanceVisitRequest::default())
        .await
        .unwrap();
    service
        .advance(first.visit.id, AdvanceVisitRequest::default())
        .await
        .unwrap();

    let today = Utc::now().date_naive();
    let stats = service.stats_for_day(Some(today)).await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.waiting, 1);
    assert_eq!(stats.in_room, 0);
    assert_eq!(stats.finished, 1);
}

#[tokio::test]
async fn board_orders_by_stage_then_queue_number() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(
            service
                .enqueue(enqueue_request(&patient))
                .await
                .unwrap()
                .visit
                .id,
        );
    }

    // Number 2 into the room, number 3 all the way through.
    service
        .advance(ids[1], AdvanceVisitRequest::default())
        .await
        .unwrap();
    service
        .advance(ids[2], AdvanceVisitRequest::default())
        .await
        .unwrap();
    service
        .advance(ids[2], AdvanceVisitRequest::default())
        .await
        .unwrap();

    let board = service.list_for_day(None).await.unwrap();
    let ordered: Vec<(VisitStatus, u32)> = board
        .visits
        .iter()
        .map(|v| (v.visit.status, v.visit.queue_number))
        .collect();

    assert_eq!(
        ordered,
        vec![
            (VisitStatus::Waiting, 1),
            (VisitStatus::Waiting, 4),
            (VisitStatus::InRoom, 2),
            (VisitStatus::Finished, 3),
        ]
    );
    assert_eq!(board.total, 4);
    assert_eq!(board.stats.waiting, 2);
}

#[tokio::test]
async fn sync_propagates_contact_edits_to_patient_and_snapshot() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;
    let visit = service.enqueue(enqueue_request(&patient)).await.unwrap();

    let updated = service
        .sync_patient_snapshot(
            visit.visit.id,
            UpdateVisitRequest {
                patient_phone: Some("0666789012".to_string()),
                patient_email: Some("ahmed.benali@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.visit.patient_phone, "0666789012");

    let canonical = state.patients.get_patient(patient.id).await.unwrap().unwrap();
    assert_eq!(canonical.phone, "0666789012");
    assert_eq!(canonical.email.as_deref(), Some("ahmed.benali@example.com"));
}

#[tokio::test]
async fn snapshot_stays_stale_until_synced() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;
    let visit = service.enqueue(enqueue_request(&patient)).await.unwrap();

    // Edit the registry directly, without syncing the visit.
    state
        .patients
        .update_patient(
            patient.id,
            PatientChanges {
                phone: Some("0666789012".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let board = service.list_for_day(None).await.unwrap();
    let entry = &board.visits[0];

    // Snapshot keeps the old value; the live join carries the new one.
    assert_eq!(entry.visit.patient_phone, "0555123456");
    assert_eq!(
        entry.patient.as_ref().unwrap().phone.as_str(),
        "0666789012"
    );

    let synced = service
        .sync_patient_snapshot(
            visit.visit.id,
            UpdateVisitRequest {
                patient_phone: Some("0666789012".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(synced.visit.patient_phone, "0666789012");
}

#[tokio::test]
async fn sync_rejects_phone_held_by_another_patient() {
    let (service, state) = setup();
    let ahmed = seed_patient(&state, "Ahmed Benali", "0555123456").await;
    seed_patient(&state, "Fatima Zahra", "0666789012").await;
    let visit = service.enqueue(enqueue_request(&ahmed)).await.unwrap();

    let result = service
        .sync_patient_snapshot(
            visit.visit.id,
            UpdateVisitRequest {
                patient_phone: Some("0666789012".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert_matches!(result, Err(QueueError::DuplicatePhone));

    let canonical = state.patients.get_patient(ahmed.id).await.unwrap().unwrap();
    assert_eq!(canonical.phone, "0555123456");
}

#[tokio::test]
async fn list_for_day_buckets_by_clinic_day() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;

    let late = Fixtures::visit_at(
        &patient,
        1,
        Utc.with_ymd_and_hms(2024, 3, 14, 23, 59, 59).unwrap(),
    );
    let early = Fixtures::visit_at(
        &patient,
        1,
        Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 1).unwrap(),
    );
    state.visits.insert_visit(late.clone()).await.unwrap();
    state.visits.insert_visit(early.clone()).await.unwrap();

    let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
    let board = service.list_for_day(Some(day)).await.unwrap();

    assert_eq!(board.total, 1);
    assert_eq!(board.visits[0].visit.id, late.id);

    let next_day = service
        .list_for_day(Some(day.succ_opt().unwrap()))
        .await
        .unwrap();
    assert_eq!(next_day.visits[0].visit.id, early.id);
}

#[tokio::test]
async fn remove_deletes_the_visit_once() {
    let (service, state) = setup();
    let patient = seed_patient(&state, "Ahmed Benali", "0555123456").await;
    let visit = service.enqueue(enqueue_request(&patient)).await.unwrap();

    service.remove(visit.visit.id).await.unwrap();
    assert_matches!(
        service.remove(visit.visit.id).await,
        Err(QueueError::VisitNotFound)
    );

    assert_matches!(
        service
            .advance(visit.visit.id, AdvanceVisitRequest::default())
            .await,
        Err(QueueError::VisitNotFound)
    );
}
