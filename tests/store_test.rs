//! Tests for ClinicDatabase
//!
//! Covers commit validation, atomicity, tree assembly, outermost-tree
//! queries and snapshot persistence.

use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use clinic::domain::{
    DomainError, DrugTreatment, Patient, PatientId, Provider, ProviderId, StructuralViolation,
    SurgeryTreatment, Treatment, TreatmentHeader, TreatmentId, TreatmentKind, MAX_FOLLOWUP_DEPTH,
};
use clinic::infrastructure::traits::{
    ChangeSet, ClinicStore, FileSystem, PatientRepository, ProviderRepository, RealFileSystem,
    StoreCounts, TreatmentRepository,
};
use clinic::infrastructure::{ClinicDatabase, StoreError};
use clinic::util::testing;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
}

fn surgery(
    id: TreatmentId,
    diagnosis: &str,
    patient: PatientId,
    provider: ProviderId,
) -> Treatment {
    Treatment::new(
        TreatmentHeader::new(id, diagnosis, patient, provider),
        TreatmentKind::Surgery(SurgeryTreatment {
            surgery_date: date(2),
            discharge_instructions: "rest".into(),
        }),
    )
}

fn drug(id: TreatmentId, diagnosis: &str, patient: PatientId, provider: ProviderId) -> Treatment {
    Treatment::new(
        TreatmentHeader::new(id, diagnosis, patient, provider),
        TreatmentKind::Drug(DrugTreatment {
            drug: "ibuprofen".into(),
            dosage: 400.0,
            start_date: date(3),
            end_date: date(10),
            frequency: 3,
        }),
    )
}

/// A store with one patient and one provider already registered.
struct Seeded {
    db: ClinicDatabase,
    patient: PatientId,
    provider: ProviderId,
}

fn seed(db: ClinicDatabase) -> Seeded {
    let patient = PatientId::new_random();
    let provider = ProviderId::new_random();
    let mut changes = ChangeSet::new();
    changes.push_provider(Provider::new(provider, "1234567890", "Dr. Grey"));
    changes.push_patient(Patient::new(patient, "Ada", date(1)));
    db.commit(changes).unwrap();
    Seeded {
        db,
        patient,
        provider,
    }
}

#[fixture]
fn seeded() -> Seeded {
    testing::init_test_setup();
    seed(ClinicDatabase::in_memory())
}

fn commit_tree(s: &Seeded, tree: Treatment, parent: Option<TreatmentId>) -> Result<(), StoreError> {
    let mut changes = ChangeSet::new();
    changes.push_tree(tree, parent);
    s.db.commit(changes)
}

// ============================================================
// Lookup
// ============================================================

#[rstest]
fn given_unknown_id_when_find_then_returns_none_and_count_zero(seeded: Seeded) {
    let id = TreatmentId::new_random();

    assert!(seeded.db.find_treatment(id).unwrap().is_none());
    assert!(seeded.db.find_treatment_with_followups(id).unwrap().is_none());
    assert_eq!(seeded.db.count_treatments_by_id(id).unwrap(), 0);
}

#[rstest]
fn given_stored_tree_when_find_shallow_then_omits_followups(seeded: Seeded) {
    let root_id = TreatmentId::new_random();
    let mut root = surgery(root_id, "appendicitis", seeded.patient, seeded.provider);
    root.add_followup(drug(
        TreatmentId::new_random(),
        "pain",
        seeded.patient,
        seeded.provider,
    ));
    commit_tree(&seeded, root.clone(), None).unwrap();

    let shallow = seeded.db.find_treatment(root_id).unwrap().unwrap();
    let eager = seeded
        .db
        .find_treatment_with_followups(root_id)
        .unwrap()
        .unwrap();

    assert!(shallow.followups().is_empty());
    assert_eq!(eager, root);
    assert_eq!(seeded.db.count_treatments_by_id(root_id).unwrap(), 1);
}

// ============================================================
// Commit validation
// ============================================================

#[rstest]
fn given_same_tree_twice_when_commit_then_counts_unchanged(seeded: Seeded) {
    let mut root = surgery(
        TreatmentId::new_random(),
        "fracture",
        seeded.patient,
        seeded.provider,
    );
    root.add_followup(drug(
        TreatmentId::new_random(),
        "pain",
        seeded.patient,
        seeded.provider,
    ));

    commit_tree(&seeded, root.clone(), None).unwrap();
    let first = seeded.db.counts().unwrap();
    commit_tree(&seeded, root, None).unwrap();

    assert_eq!(first, seeded.db.counts().unwrap());
    assert_eq!(first.treatments, 2);
}

#[rstest]
fn given_existing_treatment_when_upserted_then_details_are_updated(seeded: Seeded) {
    let id = TreatmentId::new_random();
    commit_tree(&seeded, drug(id, "headache", seeded.patient, seeded.provider), None).unwrap();

    commit_tree(&seeded, drug(id, "migraine", seeded.patient, seeded.provider), None).unwrap();

    let stored = seeded.db.find_treatment(id).unwrap().unwrap();
    assert_eq!(stored.header().diagnosis(), "migraine");
    assert_eq!(seeded.db.counts().unwrap().treatments, 1);
}

#[rstest]
fn given_unknown_patient_in_batch_when_commit_then_nothing_is_applied(seeded: Seeded) {
    // Arrange: a valid provider followed by a treatment for an unknown patient
    let new_provider = ProviderId::new_random();
    let mut changes = ChangeSet::new();
    changes.push_provider(Provider::new(new_provider, "999", "Dr. House"));
    changes.push_tree(
        drug(
            TreatmentId::new_random(),
            "cough",
            PatientId::new_random(),
            seeded.provider,
        ),
        None,
    );
    let before = seeded.db.counts().unwrap();

    // Act
    let err = seeded.db.commit(changes).unwrap_err();

    // Assert
    assert!(matches!(err, StoreError::MissingReference { kind: "patient", .. }));
    assert_eq!(seeded.db.counts().unwrap(), before);
    assert!(seeded.db.find_provider(new_provider).unwrap().is_none());
}

#[rstest]
fn given_treatment_under_other_parent_when_commit_then_rejects_reattachment(seeded: Seeded) {
    let (p, s) = (seeded.patient, seeded.provider);
    let first = TreatmentId::new_random();
    let second = TreatmentId::new_random();
    let child = TreatmentId::new_random();
    let mut root = surgery(first, "a", p, s);
    root.add_followup(drug(child, "child", p, s));
    commit_tree(&seeded, root, None).unwrap();
    commit_tree(&seeded, surgery(second, "b", p, s), None).unwrap();

    let err = commit_tree(&seeded, drug(child, "child", p, s), Some(second)).unwrap_err();

    assert!(matches!(err, StoreError::Reattachment(id) if id == child));
}

#[rstest]
fn given_changed_patient_when_upserting_then_rejects(seeded: Seeded) {
    let id = TreatmentId::new_random();
    let other_patient = PatientId::new_random();
    let mut changes = ChangeSet::new();
    changes.push_patient(Patient::new(other_patient, "Bob", date(5)));
    seeded.db.commit(changes).unwrap();
    commit_tree(&seeded, drug(id, "x", seeded.patient, seeded.provider), None).unwrap();

    let err =
        commit_tree(&seeded, drug(id, "x", other_patient, seeded.provider), None).unwrap_err();

    assert!(matches!(err, StoreError::RelationChanged(_)));
}

#[rstest]
fn given_self_parent_when_commit_then_rejects_with_structure_error(seeded: Seeded) {
    let id = TreatmentId::new_random();
    commit_tree(&seeded, drug(id, "x", seeded.patient, seeded.provider), None).unwrap();

    let err = commit_tree(&seeded, drug(id, "x", seeded.patient, seeded.provider), Some(id))
        .unwrap_err();

    assert!(matches!(err, StoreError::Structure(_)));
}

#[rstest]
fn given_unknown_parent_when_commit_then_rejects(seeded: Seeded) {
    let err = commit_tree(
        &seeded,
        drug(TreatmentId::new_random(), "x", seeded.patient, seeded.provider),
        Some(TreatmentId::new_random()),
    )
    .unwrap_err();

    assert!(matches!(err, StoreError::MissingReference { kind: "treatment", .. }));
}

#[rstest]
fn given_chain_at_depth_limit_when_committing_one_more_then_rejects_too_deep(seeded: Seeded) {
    // Arrange: one follow-up per commit until the chain is at the limit
    let root = TreatmentId::new_random();
    commit_tree(&seeded, drug(root, "R", seeded.patient, seeded.provider), None).unwrap();
    let mut tip = root;
    for level in 1..MAX_FOLLOWUP_DEPTH {
        let id = TreatmentId::new_random();
        let node = drug(id, &format!("level {level}"), seeded.patient, seeded.provider);
        commit_tree(&seeded, node, Some(tip)).unwrap();
        tip = id;
    }
    let before = seeded.db.counts().unwrap();

    // Act
    let err = commit_tree(
        &seeded,
        drug(TreatmentId::new_random(), "too deep", seeded.patient, seeded.provider),
        Some(tip),
    )
    .unwrap_err();

    // Assert: rejected, nothing stored, and the chain still loads
    assert!(
        matches!(
            err,
            StoreError::Structure(DomainError::StructuralViolation(
                StructuralViolation::TooDeep { root: r, limit }
            )) if r == root && limit == MAX_FOLLOWUP_DEPTH
        ),
        "got {err:?}"
    );
    assert_eq!(seeded.db.counts().unwrap(), before);
    let tree = seeded.db.find_treatment_with_followups(root).unwrap().unwrap();
    assert_eq!(tree.depth(), MAX_FOLLOWUP_DEPTH);
    assert_eq!(seeded.db.find_treatments_by_provider(seeded.provider).unwrap().len(), 1);
}

#[rstest]
fn given_nested_tree_below_deep_parent_when_commit_then_rejects_whole_batch(seeded: Seeded) {
    let root = TreatmentId::new_random();
    commit_tree(&seeded, drug(root, "R", seeded.patient, seeded.provider), None).unwrap();
    let mut tip = root;
    for level in 2..MAX_FOLLOWUP_DEPTH {
        let id = TreatmentId::new_random();
        let node = drug(id, &format!("level {level}"), seeded.patient, seeded.provider);
        commit_tree(&seeded, node, Some(tip)).unwrap();
        tip = id;
    }
    let mut child = drug(TreatmentId::new_random(), "fits", seeded.patient, seeded.provider);
    child.add_followup(drug(
        TreatmentId::new_random(),
        "overflows",
        seeded.patient,
        seeded.provider,
    ));
    let before = seeded.db.counts().unwrap();

    let err = commit_tree(&seeded, child, Some(tip)).unwrap_err();

    assert!(matches!(err, StoreError::Structure(_)), "got {err:?}");
    assert_eq!(seeded.db.counts().unwrap(), before);
}

// ============================================================
// Outermost trees per patient / provider
// ============================================================

#[rstest]
fn given_mixed_subtree_when_find_by_patient_then_each_treatment_appears_once(seeded: Seeded) {
    // Arrange: root (patient P) -> child (patient Q) -> grandchild (patient P)
    let other = PatientId::new_random();
    let mut changes = ChangeSet::new();
    changes.push_patient(Patient::new(other, "Q", date(6)));
    seeded.db.commit(changes).unwrap();

    let root_id = TreatmentId::new_random();
    let child_id = TreatmentId::new_random();
    let grandchild_id = TreatmentId::new_random();
    let mut child = drug(child_id, "child", other, seeded.provider);
    child.add_followup(drug(grandchild_id, "grandchild", seeded.patient, seeded.provider));
    let mut root = surgery(root_id, "root", seeded.patient, seeded.provider);
    root.add_followup(child);
    commit_tree(&seeded, root, None).unwrap();

    // Act
    let mine = seeded.db.find_treatments_by_patient(seeded.patient).unwrap();
    let theirs = seeded.db.find_treatments_by_patient(other).unwrap();

    // Assert: P's only outermost tree is the root; Q's is the child subtree
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id(), root_id);
    assert_eq!(mine[0].node_count(), 3);
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].id(), child_id);
    assert_eq!(theirs[0].followups()[0].id(), grandchild_id);
}

#[rstest]
fn given_two_roots_when_find_by_provider_then_returns_both_in_storage_order(seeded: Seeded) {
    let (p, s) = (seeded.patient, seeded.provider);
    let a = TreatmentId::new_random();
    let b = TreatmentId::new_random();
    commit_tree(&seeded, surgery(a, "a", p, s), None).unwrap();
    commit_tree(&seeded, drug(b, "b", p, s), None).unwrap();

    let trees = seeded.db.find_treatments_by_provider(s).unwrap();

    let ids: Vec<TreatmentId> = trees.iter().map(Treatment::id).collect();
    assert_eq!(ids, vec![a, b]);
    assert!(seeded
        .db
        .find_treatments_by_provider(ProviderId::new_random())
        .unwrap()
        .is_empty());
}

#[rstest]
fn given_records_when_remove_all_patients_then_treatments_go_too(seeded: Seeded) {
    commit_tree(
        &seeded,
        drug(TreatmentId::new_random(), "x", seeded.patient, seeded.provider),
        None,
    )
    .unwrap();

    seeded.db.remove_all_patients().unwrap();

    assert_eq!(
        seeded.db.counts().unwrap(),
        StoreCounts {
            providers: 1,
            patients: 0,
            treatments: 0,
        }
    );
}

// ============================================================
// Snapshot persistence
// ============================================================

#[test]
fn given_snapshot_file_when_reopened_then_records_survive() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data").join("clinic.json");
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let s = seed(ClinicDatabase::open(Arc::clone(&fs), &path).unwrap());
    let root_id = TreatmentId::new_random();
    let mut root = surgery(root_id, "knee", s.patient, s.provider);
    root.add_followup(drug(TreatmentId::new_random(), "pain", s.patient, s.provider));
    commit_tree(&s, root.clone(), None).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reopened = ClinicDatabase::open(fs, &path).unwrap();

    assert_eq!(reopened.counts().unwrap(), s.db.counts().unwrap());
    assert_eq!(
        reopened.find_treatment_with_followups(root_id).unwrap(),
        Some(root)
    );
}

#[test]
fn given_garbage_snapshot_when_open_then_fails() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("clinic.json");
    std::fs::write(&path, "not json").unwrap();

    let result = ClinicDatabase::open(Arc::new(RealFileSystem), &path);

    assert!(matches!(result, Err(StoreError::Snapshot(_))));
}

/// Real filesystem whose writes always fail.
struct ReadOnlyFileSystem;

impl FileSystem for ReadOnlyFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        RealFileSystem.read_to_string(path)
    }

    fn write(&self, _path: &Path, _content: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    fn exists(&self, path: &Path) -> bool {
        RealFileSystem.exists(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        RealFileSystem.rename(from, to)
    }

    fn ensure_parent(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn given_failing_snapshot_write_when_commit_then_memory_state_unchanged() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let db = ClinicDatabase::open(Arc::new(ReadOnlyFileSystem), &temp.path().join("c.json"))
        .unwrap();
    let mut changes = ChangeSet::new();
    changes.push_provider(Provider::new(ProviderId::new_random(), "1", "Dr. No"));

    let err = db.commit(changes).unwrap_err();

    assert!(matches!(err, StoreError::Io { .. }));
    assert_eq!(db.counts().unwrap(), StoreCounts::default());
}
