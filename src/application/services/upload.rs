//! Bulk upload service
//!
//! Applies an [`UploadDocument`] as a single change set: either every record
//! in the document is stored, or none is.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::upload::UploadDocument;
use crate::application::{ApplicationResult, StoreResultExt};
use crate::infrastructure::traits::{ChangeSet, ClinicStore};

/// Number of records stored by an upload, per section.
///
/// `treatments` counts follow-ups as well as top-level treatments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub providers: usize,
    pub patients: usize,
    pub treatments: usize,
}

pub struct UploadService {
    store: Arc<dyn ClinicStore>,
}

impl UploadService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Parse and apply a raw upload body.
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    pub fn upload(&self, bytes: &[u8]) -> ApplicationResult<UploadSummary> {
        let document = UploadDocument::from_slice(bytes)?;
        self.apply(document)
    }

    /// Apply an already parsed document.
    pub fn apply(&self, document: UploadDocument) -> ApplicationResult<UploadSummary> {
        let mut summary = UploadSummary {
            providers: document.providers.len(),
            patients: document.patients.len(),
            treatments: 0,
        };
        let mut changes = ChangeSet::new();
        for provider in document.providers {
            changes.push_provider(provider.into_provider());
        }
        for patient in document.patients {
            changes.push_patient(patient.into_patient());
        }
        for treatment in document.treatments {
            summary.treatments += treatment.ids().len();
            changes.push_tree(treatment.into_treatment(), None);
        }
        debug!("upload: committing {} changes", changes.len());
        self.store.commit(changes).with_context("apply upload")?;
        info!(
            providers = summary.providers,
            patients = summary.patients,
            treatments = summary.treatments,
            "upload applied"
        );
        Ok(summary)
    }
}
