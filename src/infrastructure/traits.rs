//! I/O boundary traits for testability
//!
//! [`FileSystem`] abstracts the snapshot file, the repository traits abstract
//! record storage. Services depend on these traits only.

use std::io;
use std::path::Path;

use crate::domain::{
    Patient, PatientId, Provider, ProviderId, Treatment, TreatmentHeader, TreatmentId,
    TreatmentKind,
};
use crate::infrastructure::error::StoreResult;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Rename/move a file.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Lookup and bulk removal of treatments.
///
/// Shallow and eager loads are separate operations: callers decide whether
/// they need the follow-up subtree.
pub trait TreatmentRepository: Send + Sync {
    /// Load one treatment without its follow-ups.
    fn find_treatment(&self, id: TreatmentId) -> StoreResult<Option<Treatment>>;

    /// Load one treatment with its whole follow-up subtree.
    fn find_treatment_with_followups(&self, id: TreatmentId) -> StoreResult<Option<Treatment>>;

    /// Number of stored treatments with this id (0 or 1).
    fn count_treatments_by_id(&self, id: TreatmentId) -> StoreResult<u64>;

    /// Outermost treatment trees of a patient, in storage order.
    fn find_treatments_by_patient(&self, patient: PatientId) -> StoreResult<Vec<Treatment>>;

    /// Outermost treatment trees administered by a provider, in storage order.
    fn find_treatments_by_provider(&self, provider: ProviderId) -> StoreResult<Vec<Treatment>>;

    fn remove_all_treatments(&self) -> StoreResult<()>;
}

pub trait PatientRepository: Send + Sync {
    fn find_patient(&self, id: PatientId) -> StoreResult<Option<Patient>>;

    /// Remove every patient, and with them every treatment.
    fn remove_all_patients(&self) -> StoreResult<()>;
}

pub trait ProviderRepository: Send + Sync {
    fn find_provider(&self, id: ProviderId) -> StoreResult<Option<Provider>>;

    /// Remove every provider, and with them every treatment.
    fn remove_all_providers(&self) -> StoreResult<()>;
}

/// Record counts per entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub providers: usize,
    pub patients: usize,
    pub treatments: usize,
}

/// Complete record store.
pub trait ClinicStore: TreatmentRepository + PatientRepository + ProviderRepository {
    /// Apply every change in order, or none of them.
    fn commit(&self, changes: ChangeSet) -> StoreResult<()>;

    fn counts(&self) -> StoreResult<StoreCounts>;
}

/// A treatment as stored: no follow-ups, but a link to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentRecord {
    pub header: TreatmentHeader,
    pub kind: TreatmentKind,
    pub parent: Option<TreatmentId>,
}

/// One upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Provider(Provider),
    Patient(Patient),
    Treatment(TreatmentRecord),
}

/// Ordered batch of upserts applied atomically by [`ClinicStore::commit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_provider(&mut self, provider: Provider) {
        self.changes.push(Change::Provider(provider));
    }

    pub fn push_patient(&mut self, patient: Patient) {
        self.changes.push(Change::Patient(patient));
    }

    /// Flatten a treatment tree into records, parents before children.
    pub fn push_tree(&mut self, tree: Treatment, parent: Option<TreatmentId>) {
        let mut stack = vec![(tree, parent)];
        while let Some((node, parent)) = stack.pop() {
            let (header, kind, followups) = node.into_parts();
            let id = header.id();
            self.changes.push(Change::Treatment(TreatmentRecord {
                header,
                kind,
                parent,
            }));
            for child in followups.into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
