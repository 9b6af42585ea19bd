//! Application-level errors (wraps domain and store errors)

use thiserror::Error;

use crate::domain::{DomainError, PatientId, ProviderId, TreatmentId};
use crate::infrastructure::StoreError;

/// Application errors wrap domain errors and add use-case context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("patient not found: {0}")]
    PatientNotFound(PatientId),

    #[error("provider not found: {0}")]
    ProviderNotFound(ProviderId),

    #[error("treatment {treatment} not found for provider {provider}")]
    TreatmentNotFound {
        provider: ProviderId,
        treatment: TreatmentId,
    },

    #[error("invalid upload document: {message}")]
    UploadFormat { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("persistence failed: {context}")]
    Persistence {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl ApplicationError {
    /// Wrap a store error, lifting structural problems to domain errors.
    pub fn persistence(context: impl Into<String>, source: StoreError) -> Self {
        match source {
            StoreError::Structure(e) => ApplicationError::Domain(e),
            source => ApplicationError::Persistence {
                context: context.into(),
                source,
            },
        }
    }

    /// True for not-found conditions.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApplicationError::PatientNotFound(_)
                | ApplicationError::ProviderNotFound(_)
                | ApplicationError::TreatmentNotFound { .. }
        )
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
