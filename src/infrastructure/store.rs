//! In-memory record store with optional JSON snapshot persistence.
//!
//! Treatments are stored flat, one record per treatment with a link to its
//! parent, keyed by a storage row id and indexed uniquely by treatment id.
//! Trees are assembled on demand.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{
    Patient, PatientId, Provider, ProviderId, RowId, StructuralViolation, Treatment,
    TreatmentHeader, TreatmentId, TreatmentKind, MAX_FOLLOWUP_DEPTH,
};
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::traits::{
    Change, ChangeSet, ClinicStore, FileSystem, PatientRepository, ProviderRepository,
    StoreCounts, TreatmentRecord, TreatmentRepository,
};

/// One stored treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredTreatment {
    row: RowId,
    header: TreatmentHeader,
    kind: TreatmentKind,
    parent: Option<TreatmentId>,
}

impl StoredTreatment {
    fn to_treatment(&self) -> Treatment {
        Treatment::new(self.header.clone(), self.kind.clone())
    }
}

/// On-disk form of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    providers: Vec<Provider>,
    patients: Vec<Patient>,
    treatments: Vec<StoredTreatment>,
}

#[derive(Debug, Clone, Default)]
struct State {
    providers: BTreeMap<ProviderId, Provider>,
    patients: BTreeMap<PatientId, Patient>,
    treatments: BTreeMap<RowId, StoredTreatment>,
    /// Unique index: treatment id -> row
    index: HashMap<TreatmentId, RowId>,
    last_row: RowId,
}

impl State {
    fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        let mut state = State::default();
        for provider in snapshot.providers {
            state.providers.insert(provider.id, provider);
        }
        for patient in snapshot.patients {
            state.patients.insert(patient.id, patient);
        }
        for stored in snapshot.treatments {
            let id = stored.header.id();
            if state.index.insert(id, stored.row).is_some() {
                return Err(StoreError::CorruptSnapshot {
                    message: format!("treatment {id} stored twice"),
                });
            }
            if state.treatments.contains_key(&stored.row) {
                return Err(StoreError::CorruptSnapshot {
                    message: format!("row {} stored twice", stored.row),
                });
            }
            state.last_row = state.last_row.max(stored.row);
            state.treatments.insert(stored.row, stored);
        }
        for stored in state.treatments.values() {
            if let Some(parent) = stored.parent {
                if !state.index.contains_key(&parent) {
                    return Err(StructuralViolation::DanglingParent {
                        child: stored.header.id(),
                        parent,
                    }
                    .into_store());
                }
            }
        }
        Ok(state)
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            providers: self.providers.values().cloned().collect(),
            patients: self.patients.values().cloned().collect(),
            treatments: self.treatments.values().cloned().collect(),
        }
    }

    fn get(&self, id: TreatmentId) -> Option<&StoredTreatment> {
        self.index.get(&id).and_then(|row| self.treatments.get(row))
    }

    fn apply(&mut self, change: Change) -> StoreResult<()> {
        match change {
            Change::Provider(provider) => {
                self.providers.insert(provider.id, provider);
            }
            Change::Patient(patient) => {
                self.patients.insert(patient.id, patient);
            }
            Change::Treatment(record) => self.upsert_treatment(record)?,
        }
        Ok(())
    }

    fn upsert_treatment(&mut self, record: TreatmentRecord) -> StoreResult<()> {
        let id = record.header.id();
        let patient = record.header.patient();
        let provider = record.header.provider();
        if !self.patients.contains_key(&patient) {
            return Err(StoreError::MissingReference {
                kind: "patient",
                id: patient.to_string(),
            });
        }
        if !self.providers.contains_key(&provider) {
            return Err(StoreError::MissingReference {
                kind: "provider",
                id: provider.to_string(),
            });
        }
        if let Some(parent) = record.parent {
            if parent == id {
                return Err(StructuralViolation::Cycle(id).into_store());
            }
            if !self.index.contains_key(&parent) {
                return Err(StoreError::MissingReference {
                    kind: "treatment",
                    id: parent.to_string(),
                });
            }
            let (root, depth) = self.lineage(parent)?;
            if depth + 1 > MAX_FOLLOWUP_DEPTH {
                return Err(StructuralViolation::TooDeep {
                    root,
                    limit: MAX_FOLLOWUP_DEPTH,
                }
                .into_store());
            }
        }

        match self.index.get(&id).copied() {
            Some(row) => {
                let stored = self
                    .treatments
                    .get_mut(&row)
                    .ok_or_else(|| StoreError::CorruptSnapshot {
                        message: format!("index points at missing row {row}"),
                    })?;
                if stored.parent != record.parent {
                    return Err(StoreError::Reattachment(id));
                }
                if stored.header.patient() != patient || stored.header.provider() != provider {
                    return Err(StoreError::RelationChanged(id));
                }
                debug!("upsert_treatment: updating {} at row {}", id, row);
                stored.header = record.header;
                stored.kind = record.kind;
            }
            None => {
                let row = self.last_row.next();
                debug!("upsert_treatment: inserting {} at row {}", id, row);
                self.last_row = row;
                self.index.insert(id, row);
                self.treatments.insert(
                    row,
                    StoredTreatment {
                        row,
                        header: record.header,
                        kind: record.kind,
                        parent: record.parent,
                    },
                );
            }
        }
        Ok(())
    }

    /// Outermost ancestor of `id` and the number of treatments on the chain
    /// from it down to `id`, both ends included.
    fn lineage(&self, id: TreatmentId) -> StoreResult<(TreatmentId, usize)> {
        let mut seen = HashSet::new();
        let mut current = id;
        loop {
            if !seen.insert(current) {
                return Err(StructuralViolation::Cycle(current).into_store());
            }
            let Some(stored) = self.get(current) else {
                return Err(StoreError::MissingReference {
                    kind: "treatment",
                    id: current.to_string(),
                });
            };
            match stored.parent {
                Some(parent) => current = parent,
                None => return Ok((current, seen.len())),
            }
        }
    }

    /// Parent id -> child records in row order.
    fn children(&self) -> HashMap<TreatmentId, Vec<&StoredTreatment>> {
        let mut children: HashMap<TreatmentId, Vec<&StoredTreatment>> = HashMap::new();
        for stored in self.treatments.values() {
            if let Some(parent) = stored.parent {
                children.entry(parent).or_default().push(stored);
            }
        }
        children
    }

    /// Build the tree rooted at `stored`.
    fn assemble(
        &self,
        stored: &StoredTreatment,
        children: &HashMap<TreatmentId, Vec<&StoredTreatment>>,
    ) -> StoreResult<Treatment> {
        let mut visited = HashSet::new();
        self.assemble_from(stored.header.id(), stored, children, &mut visited, 1)
    }

    fn assemble_from(
        &self,
        root: TreatmentId,
        stored: &StoredTreatment,
        children: &HashMap<TreatmentId, Vec<&StoredTreatment>>,
        visited: &mut HashSet<TreatmentId>,
        depth: usize,
    ) -> StoreResult<Treatment> {
        let id = stored.header.id();
        if !visited.insert(id) {
            return Err(StructuralViolation::Cycle(id).into_store());
        }
        if depth > MAX_FOLLOWUP_DEPTH {
            return Err(StructuralViolation::TooDeep {
                root,
                limit: MAX_FOLLOWUP_DEPTH,
            }
            .into_store());
        }
        let mut node = stored.to_treatment();
        for child in children.get(&id).into_iter().flatten() {
            node.add_followup(self.assemble_from(root, child, children, visited, depth + 1)?);
        }
        Ok(node)
    }

    /// True if some ancestor of `stored` satisfies `pred`.
    fn has_ancestor(
        &self,
        stored: &StoredTreatment,
        pred: impl Fn(&StoredTreatment) -> bool,
    ) -> StoreResult<bool> {
        let mut seen = HashSet::from([stored.header.id()]);
        let mut current = stored.parent;
        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                return Err(StructuralViolation::Cycle(parent_id).into_store());
            }
            let Some(parent) = self.get(parent_id) else {
                return Err(StructuralViolation::DanglingParent {
                    child: stored.header.id(),
                    parent: parent_id,
                }
                .into_store());
            };
            if pred(parent) {
                return Ok(true);
            }
            current = parent.parent;
        }
        Ok(false)
    }

    /// Trees rooted at every matching record that has no matching ancestor.
    fn outermost(&self, pred: impl Fn(&StoredTreatment) -> bool) -> StoreResult<Vec<Treatment>> {
        let children = self.children();
        let mut trees = Vec::new();
        for stored in self.treatments.values().filter(|s| pred(*s)) {
            if self.has_ancestor(stored, &pred)? {
                continue;
            }
            trees.push(self.assemble(stored, &children)?);
        }
        Ok(trees)
    }
}

trait IntoStoreError {
    fn into_store(self) -> StoreError;
}

impl IntoStoreError for StructuralViolation {
    fn into_store(self) -> StoreError {
        StoreError::Structure(self.into())
    }
}

/// The clinic's record store.
///
/// All reads take a shared lock; a commit holds the write lock for the whole
/// batch, applies it to a working copy and swaps the copy in only after it has
/// been persisted.
pub struct ClinicDatabase {
    state: RwLock<State>,
    snapshot: Option<(Arc<dyn FileSystem>, PathBuf)>,
}

impl ClinicDatabase {
    /// Create an empty store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(State::default()),
            snapshot: None,
        }
    }

    /// Open a store backed by a snapshot file, loading it if present.
    #[instrument(level = "debug", skip(fs))]
    pub fn open(fs: Arc<dyn FileSystem>, path: &Path) -> StoreResult<Self> {
        let state = if fs.exists(path) {
            let content = fs
                .read_to_string(path)
                .map_err(|e| StoreError::io(format!("read snapshot {}", path.display()), e))?;
            let snapshot: Snapshot = serde_json::from_str(&content)?;
            State::from_snapshot(snapshot)?
        } else {
            debug!("open: no snapshot at {}, starting empty", path.display());
            State::default()
        };
        Ok(Self {
            state: RwLock::new(state),
            snapshot: Some((fs, path.to_path_buf())),
        })
    }

    fn persist(&self, state: &State) -> StoreResult<()> {
        let Some((fs, path)) = &self.snapshot else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(&state.to_snapshot())?;
        let tmp = path.with_extension("tmp");
        fs.ensure_parent(path)
            .map_err(|e| StoreError::io(format!("create dir for {}", path.display()), e))?;
        fs.write(&tmp, &content)
            .map_err(|e| StoreError::io(format!("write {}", tmp.display()), e))?;
        fs.rename(&tmp, path)
            .map_err(|e| StoreError::io(format!("replace {}", path.display()), e))?;
        debug!("persist: wrote snapshot {}", path.display());
        Ok(())
    }

    /// Replace the state through `update`, persisting before the swap.
    fn mutate(&self, update: impl FnOnce(&mut State) -> StoreResult<()>) -> StoreResult<()> {
        let mut state = self.state.write();
        let mut working = state.clone();
        update(&mut working)?;
        self.persist(&working)?;
        *state = working;
        Ok(())
    }
}

impl TreatmentRepository for ClinicDatabase {
    fn find_treatment(&self, id: TreatmentId) -> StoreResult<Option<Treatment>> {
        Ok(self.state.read().get(id).map(StoredTreatment::to_treatment))
    }

    fn find_treatment_with_followups(&self, id: TreatmentId) -> StoreResult<Option<Treatment>> {
        let state = self.state.read();
        let Some(stored) = state.get(id) else {
            return Ok(None);
        };
        let children = state.children();
        state.assemble(stored, &children).map(Some)
    }

    fn count_treatments_by_id(&self, id: TreatmentId) -> StoreResult<u64> {
        Ok(u64::from(self.state.read().index.contains_key(&id)))
    }

    fn find_treatments_by_patient(&self, patient: PatientId) -> StoreResult<Vec<Treatment>> {
        self.state
            .read()
            .outermost(|s| s.header.patient() == patient)
    }

    fn find_treatments_by_provider(&self, provider: ProviderId) -> StoreResult<Vec<Treatment>> {
        self.state
            .read()
            .outermost(|s| s.header.provider() == provider)
    }

    fn remove_all_treatments(&self) -> StoreResult<()> {
        self.mutate(|state| {
            state.treatments.clear();
            state.index.clear();
            Ok(())
        })
    }
}

impl PatientRepository for ClinicDatabase {
    fn find_patient(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        Ok(self.state.read().patients.get(&id).cloned())
    }

    fn remove_all_patients(&self) -> StoreResult<()> {
        self.mutate(|state| {
            state.patients.clear();
            state.treatments.clear();
            state.index.clear();
            Ok(())
        })
    }
}

impl ProviderRepository for ClinicDatabase {
    fn find_provider(&self, id: ProviderId) -> StoreResult<Option<Provider>> {
        Ok(self.state.read().providers.get(&id).cloned())
    }

    fn remove_all_providers(&self) -> StoreResult<()> {
        self.mutate(|state| {
            state.providers.clear();
            state.treatments.clear();
            state.index.clear();
            Ok(())
        })
    }
}

impl ClinicStore for ClinicDatabase {
    #[instrument(level = "debug", skip(self, changes), fields(changes = changes.len()))]
    fn commit(&self, changes: ChangeSet) -> StoreResult<()> {
        self.mutate(|state| {
            for change in changes {
                state.apply(change)?;
            }
            Ok(())
        })
    }

    fn counts(&self) -> StoreResult<StoreCounts> {
        let state = self.state.read();
        Ok(StoreCounts {
            providers: state.providers.len(),
            patients: state.patients.len(),
            treatments: state.treatments.len(),
        })
    }
}
