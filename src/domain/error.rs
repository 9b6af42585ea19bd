//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::ids::TreatmentId;

/// Domain errors represent violations of the record model itself.
/// They carry no transport or storage concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed {kind} id: {value}")]
    MalformedIdentifier { kind: &'static str, value: String },

    #[error("structural violation: {0}")]
    StructuralViolation(#[from] StructuralViolation),
}

/// Ways a follow-up hierarchy can fail to be a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralViolation {
    #[error("treatment {0} appears more than once in its own follow-up tree")]
    Cycle(TreatmentId),

    #[error("follow-up chain below treatment {root} is deeper than {limit}")]
    TooDeep { root: TreatmentId, limit: usize },

    #[error("follow-up {child} references missing parent {parent}")]
    DanglingParent {
        child: TreatmentId,
        parent: TreatmentId,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
