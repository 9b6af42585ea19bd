//! Provider service
//!
//! Registers providers, records the treatments they administer and reads
//! both back as DTOs.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::dto::{ProviderDto, TreatmentDto};
use crate::application::exporters::TreatmentDtoExporter;
use crate::application::{ApplicationError, ApplicationResult, StoreResultExt};
use crate::domain::{ProviderId, Treatment, TreatmentId};
use crate::infrastructure::traits::{ChangeSet, ClinicStore};

/// Service for providers and their treatments.
pub struct ProviderService {
    store: Arc<dyn ClinicStore>,
}

impl ProviderService {
    /// Create a new provider service.
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Insert or replace a provider. Treatments in the DTO are ignored.
    pub fn add_provider(&self, dto: ProviderDto) -> ApplicationResult<ProviderId> {
        let provider = dto.into_provider();
        let id = provider.id;
        debug!("add_provider: {}", id);
        let mut changes = ChangeSet::new();
        changes.push_provider(provider);
        self.store.commit(changes).with_context("add provider")?;
        Ok(id)
    }

    /// Load a provider, optionally with every treatment they administer.
    pub fn get_provider(
        &self,
        id: ProviderId,
        include_treatments: bool,
    ) -> ApplicationResult<ProviderDto> {
        let provider = self
            .store
            .find_provider(id)
            .with_context("load provider")?
            .ok_or(ApplicationError::ProviderNotFound(id))?;
        let mut dto = ProviderDto::from(&provider);
        if include_treatments {
            let trees = self
                .store
                .find_treatments_by_provider(id)
                .with_context("load provider treatments")?;
            for tree in trees {
                dto.treatments.push(tree.export(&mut TreatmentDtoExporter)?);
            }
        }
        Ok(dto)
    }

    /// Record a treatment together with its nested follow-ups.
    ///
    /// The patient and provider must already exist. Re-adding a treatment
    /// updates it in place.
    pub fn add_treatment(&self, dto: TreatmentDto) -> ApplicationResult<TreatmentId> {
        let treatment = dto.into_treatment();
        self.ensure_references(&treatment)?;
        let id = treatment.id();
        debug!(
            "add_treatment: {} with {} records",
            id,
            treatment.node_count()
        );
        let mut changes = ChangeSet::new();
        changes.push_tree(treatment, None);
        self.store.commit(changes).with_context("add treatment")?;
        Ok(id)
    }

    /// Record `followup` below an existing treatment.
    pub fn add_followup(
        &self,
        parent: TreatmentId,
        followup: TreatmentDto,
    ) -> ApplicationResult<TreatmentId> {
        let parent_treatment = self
            .store
            .find_treatment(parent)
            .with_context("load parent treatment")?;
        let Some(parent_treatment) = parent_treatment else {
            return Err(ApplicationError::TreatmentNotFound {
                provider: followup.provider_id,
                treatment: parent,
            });
        };
        let treatment = followup.into_treatment();
        self.ensure_references(&treatment)?;
        let id = treatment.id();
        debug!("add_followup: {} below {}", id, parent_treatment.id());
        let mut changes = ChangeSet::new();
        changes.push_tree(treatment, Some(parent));
        self.store.commit(changes).with_context("add follow-up")?;
        Ok(id)
    }

    /// Load one treatment administered by `provider`, with its follow-ups.
    ///
    /// A treatment administered by someone else is reported as not found.
    pub fn get_treatment(
        &self,
        provider: ProviderId,
        treatment: TreatmentId,
    ) -> ApplicationResult<TreatmentDto> {
        let not_found = || ApplicationError::TreatmentNotFound {
            provider,
            treatment,
        };
        let tree = self
            .store
            .find_treatment_with_followups(treatment)
            .with_context("load treatment")?
            .ok_or_else(not_found)?;
        if tree.header().provider() != provider {
            debug!(
                "get_treatment: {} is administered by {}, not {}",
                treatment,
                tree.header().provider(),
                provider
            );
            return Err(not_found());
        }
        Ok(tree.export(&mut TreatmentDtoExporter)?)
    }

    /// Remove all providers and, with them, all treatments.
    pub fn remove_all(&self) -> ApplicationResult<()> {
        info!("removing all providers");
        self.store
            .remove_all_providers()
            .with_context("remove all providers")
    }

    /// Remove all treatments, keeping patients and providers.
    pub fn remove_all_treatments(&self) -> ApplicationResult<()> {
        info!("removing all treatments");
        self.store
            .remove_all_treatments()
            .with_context("remove all treatments")
    }

    fn ensure_references(&self, tree: &Treatment) -> ApplicationResult<()> {
        for node in tree.iter() {
            let header = node.header();
            if self
                .store
                .find_patient(header.patient())
                .with_context("load patient")?
                .is_none()
            {
                return Err(ApplicationError::PatientNotFound(header.patient()));
            }
            if self
                .store
                .find_provider(header.provider())
                .with_context("load provider")?
                .is_none()
            {
                return Err(ApplicationError::ProviderNotFound(header.provider()));
            }
        }
        Ok(())
    }
}
