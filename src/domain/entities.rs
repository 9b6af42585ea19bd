//! Domain entities: patients and providers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{PatientId, ProviderId};

/// A person receiving care at the clinic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    /// Date of birth
    pub dob: NaiveDate,
}

impl Patient {
    pub fn new(id: PatientId, name: impl Into<String>, dob: NaiveDate) -> Self {
        Self {
            id,
            name: name.into(),
            dob,
        }
    }
}

/// A clinician administering treatments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    /// National provider identifier
    pub npi: String,
    pub name: String,
}

impl Provider {
    pub fn new(id: ProviderId, npi: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            npi: npi.into(),
            name: name.into(),
        }
    }
}
