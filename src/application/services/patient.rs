//! Patient service
//!
//! Registers patients and reads them back with their treatment trees.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::dto::PatientDto;
use crate::application::exporters::TreatmentDtoExporter;
use crate::application::{ApplicationError, ApplicationResult, StoreResultExt};
use crate::domain::PatientId;
use crate::infrastructure::traits::{ChangeSet, ClinicStore};

/// Service for patient records.
pub struct PatientService {
    store: Arc<dyn ClinicStore>,
}

impl PatientService {
    /// Create a new patient service.
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Insert or replace a patient. Treatments in the DTO are ignored.
    pub fn add_patient(&self, dto: PatientDto) -> ApplicationResult<PatientId> {
        let patient = dto.into_patient();
        let id = patient.id;
        debug!("add_patient: {}", id);
        let mut changes = ChangeSet::new();
        changes.push_patient(patient);
        self.store.commit(changes).with_context("add patient")?;
        Ok(id)
    }

    /// Load a patient, optionally with every treatment they received.
    pub fn get_patient(
        &self,
        id: PatientId,
        include_treatments: bool,
    ) -> ApplicationResult<PatientDto> {
        let patient = self
            .store
            .find_patient(id)
            .with_context("load patient")?
            .ok_or(ApplicationError::PatientNotFound(id))?;
        let mut dto = PatientDto::from(&patient);
        if include_treatments {
            let trees = self
                .store
                .find_treatments_by_patient(id)
                .with_context("load patient treatments")?;
            for tree in trees {
                dto.treatments.push(tree.export(&mut TreatmentDtoExporter)?);
            }
            debug!(
                "get_patient: {} with {} top-level treatments",
                id,
                dto.treatments.len()
            );
        }
        Ok(dto)
    }

    /// Remove all patients and, with them, all treatments.
    pub fn remove_all(&self) -> ApplicationResult<()> {
        info!("removing all patients");
        self.store
            .remove_all_patients()
            .with_context("remove all patients")
    }
}
