//! Domain layer: clinic records and the treatment hierarchy
//!
//! This layer is independent of external concerns (no I/O, no HTTP, no config loading).

pub mod entities;
pub mod error;
pub mod export;
pub mod ids;
pub mod treatment;

pub use entities::{Patient, Provider};
pub use error::{DomainError, DomainResult, StructuralViolation};
pub use export::{TreatmentExporter, MAX_FOLLOWUP_DEPTH};
pub use ids::{PatientId, ProviderId, RowId, TreatmentId};
pub use treatment::{
    DrugTreatment, PhysiotherapyTreatment, RadiologyTreatment, SurgeryTreatment, Treatment,
    TreatmentHeader, TreatmentKind,
};
