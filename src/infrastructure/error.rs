//! Infrastructure-level errors
//!
//! [`StoreError`] is what repositories report; the application layer wraps it.
//! [`InfraError`] wraps application errors and adds server/I/O concerns.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{DomainError, TreatmentId};

/// Errors raised by the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} {id} does not exist")]
    MissingReference { kind: &'static str, id: String },

    #[error("treatment {0} is already attached to a different parent")]
    Reattachment(TreatmentId),

    #[error("treatment {0} cannot change its patient or provider")]
    RelationChanged(TreatmentId),

    #[error("{0}")]
    Structure(#[from] DomainError),

    #[error("corrupt snapshot: {message}")]
    CorruptSnapshot { message: String },

    #[error("snapshot encoding failed")]
    Snapshot(#[from] serde_json::Error),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http server failed: {message}")]
    Server { message: String },

    #[error("output encoding failed")]
    Encoding(#[from] serde_json::Error),
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
