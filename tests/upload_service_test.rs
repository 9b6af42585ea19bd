//! Tests for UploadService
//!
//! An upload is parsed completely before anything is written, then committed
//! as one batch: it is applied entirely or not at all.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::{json, Value};

use clinic::application::services::{PatientService, ProviderService, UploadService};
use clinic::application::ApplicationError;
use clinic::domain::{PatientId, ProviderId, TreatmentId};
use clinic::infrastructure::traits::{ClinicStore, StoreCounts};
use clinic::infrastructure::ClinicDatabase;
use clinic::util::testing;

struct Fixture {
    store: Arc<dyn ClinicStore>,
    uploads: UploadService,
    patients: PatientService,
    providers: ProviderService,
}

#[fixture]
fn services() -> Fixture {
    testing::init_test_setup();
    let store: Arc<dyn ClinicStore> = Arc::new(ClinicDatabase::in_memory());
    Fixture {
        uploads: UploadService::new(Arc::clone(&store)),
        patients: PatientService::new(Arc::clone(&store)),
        providers: ProviderService::new(Arc::clone(&store)),
        store,
    }
}

struct Ids {
    patient: PatientId,
    provider: ProviderId,
    root: TreatmentId,
    followup: TreatmentId,
}

#[fixture]
fn ids() -> Ids {
    Ids {
        patient: PatientId::new_random(),
        provider: ProviderId::new_random(),
        root: TreatmentId::new_random(),
        followup: TreatmentId::new_random(),
    }
}

fn provider_json(ids: &Ids) -> Value {
    json!({"id": ids.provider.to_string(), "npi": "1112223334", "name": "Dr. Who"})
}

fn patient_json(ids: &Ids) -> Value {
    json!({"id": ids.patient.to_string(), "name": "Rose", "dob": "1987-04-01"})
}

fn treatment_json(ids: &Ids) -> Value {
    json!({
        "id": ids.root.to_string(),
        "patientId": ids.patient.to_string(),
        "providerId": ids.provider.to_string(),
        "diagnosis": "broken arm",
        "type": "surgery",
        "surgeryDate": "2024-01-05",
        "dischargeInstructions": "keep cast dry",
        "followupTreatments": [{
            "id": ids.followup.to_string(),
            "patientId": ids.patient.to_string(),
            "providerId": ids.provider.to_string(),
            "diagnosis": "stiffness",
            "type": "physiotherapy",
            "treatmentDates": ["2024-02-01", "2024-02-08"]
        }]
    })
}

fn document(ids: &Ids) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "providers": [provider_json(ids)],
        "patients": [patient_json(ids)],
        "treatments": [treatment_json(ids)],
    }))
    .unwrap()
}

#[rstest]
fn given_valid_document_when_upload_then_all_records_stored(services: Fixture, ids: Ids) {
    // Act
    let summary = services.uploads.upload(&document(&ids)).unwrap();

    // Assert
    assert_eq!(
        (summary.providers, summary.patients, summary.treatments),
        (1, 1, 2)
    );
    let patient = services.patients.get_patient(ids.patient, true).unwrap();
    assert_eq!(patient.treatments.len(), 1);
    assert_eq!(patient.treatments[0].followup_treatments[0].id, ids.followup);
    let treatment = services
        .providers
        .get_treatment(ids.provider, ids.followup)
        .unwrap();
    assert_eq!(treatment.diagnosis, "stiffness");
}

#[rstest]
fn given_same_document_twice_when_upload_then_counts_unchanged(services: Fixture, ids: Ids) {
    services.uploads.upload(&document(&ids)).unwrap();
    let first = services.store.counts().unwrap();

    services.uploads.upload(&document(&ids)).unwrap();

    assert_eq!(services.store.counts().unwrap(), first);
}

#[rstest]
fn given_sections_out_of_order_when_upload_then_format_error_and_nothing_stored(
    services: Fixture,
    ids: Ids,
) {
    // Arrange: providers, treatments, patients
    let body = format!(
        r#"{{"providers": [{}], "treatments": [{}], "patients": [{}]}}"#,
        provider_json(&ids),
        treatment_json(&ids),
        patient_json(&ids)
    );

    // Act
    let err = services.uploads.upload(body.as_bytes()).unwrap_err();

    // Assert
    match err {
        ApplicationError::UploadFormat { message } => {
            assert!(
                message.contains("unexpected label, expected patients, found treatments"),
                "message: {message}"
            );
        }
        other => panic!("expected UploadFormat, got {other:?}"),
    }
    assert_eq!(services.store.counts().unwrap(), StoreCounts::default());
}

#[rstest]
fn given_treatment_for_unknown_patient_when_upload_then_nothing_stored(
    services: Fixture,
    ids: Ids,
) {
    // Arrange: the patient section is empty, so the treatment dangles
    let body = serde_json::to_vec(&json!({
        "providers": [provider_json(&ids)],
        "patients": [],
        "treatments": [treatment_json(&ids)],
    }))
    .unwrap();

    // Act
    let err = services.uploads.upload(&body).unwrap_err();

    // Assert: the provider that preceded the failure was not kept either
    assert!(matches!(err, ApplicationError::Persistence { .. }));
    assert_eq!(services.store.counts().unwrap(), StoreCounts::default());
}

#[rstest]
fn given_malformed_record_when_upload_then_format_error(services: Fixture, ids: Ids) {
    let mut bad = treatment_json(&ids);
    bad["type"] = json!("acupuncture");
    let body = serde_json::to_vec(&json!({
        "providers": [provider_json(&ids)],
        "patients": [patient_json(&ids)],
        "treatments": [bad],
    }))
    .unwrap();

    let err = services.uploads.upload(&body).unwrap_err();

    assert!(matches!(err, ApplicationError::UploadFormat { .. }));
    assert_eq!(services.store.counts().unwrap(), StoreCounts::default());
}
