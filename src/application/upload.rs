//! Bulk upload document.
//!
//! A client that collected records offline sends them in one JSON object:
//!
//! ```json
//! {
//!   "providers":  [ provider1, ..., providerK ],
//!   "patients":   [ patient1, ..., patientM ],
//!   "treatments": [ treatment1, ..., treatmentN ]
//! }
//! ```
//!
//! The three sections must all be present and appear in exactly this order,
//! so that every record's references precede it.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::application::dto::{PatientDto, ProviderDto, TreatmentDto};
use crate::application::{ApplicationError, ApplicationResult};

pub const PROVIDERS: &str = "providers";
pub const PATIENTS: &str = "patients";
pub const TREATMENTS: &str = "treatments";

/// A parsed upload, sections in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadDocument {
    pub providers: Vec<ProviderDto>,
    pub patients: Vec<PatientDto>,
    pub treatments: Vec<TreatmentDto>,
}

impl UploadDocument {
    /// Parse a complete document. Nothing is applied until this succeeds.
    pub fn from_slice(bytes: &[u8]) -> ApplicationResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| ApplicationError::UploadFormat {
            message: e.to_string(),
        })
    }
}

impl<'de> Deserialize<'de> for UploadDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(UploadVisitor)
    }
}

struct UploadVisitor;

impl<'de> Visitor<'de> for UploadVisitor {
    type Value = UploadDocument;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "an object with {PROVIDERS}, {PATIENTS} and {TREATMENTS} sections in that order"
        )
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let providers = next_section(&mut map, PROVIDERS)?;
        let patients = next_section(&mut map, PATIENTS)?;
        let treatments = next_section(&mut map, TREATMENTS)?;
        if let Some(label) = map.next_key::<String>()? {
            return Err(de::Error::custom(format!(
                "unexpected label {label} after {TREATMENTS}"
            )));
        }
        Ok(UploadDocument {
            providers,
            patients,
            treatments,
        })
    }
}

fn next_section<'de, A, T>(map: &mut A, expected: &str) -> Result<Vec<T>, A::Error>
where
    A: MapAccess<'de>,
    T: Deserialize<'de>,
{
    match map.next_key::<String>()? {
        Some(label) if label == expected => map.next_value(),
        Some(label) => Err(de::Error::custom(format!(
            "unexpected label, expected {expected}, found {label}"
        ))),
        None => Err(de::Error::custom(format!("missing section {expected}"))),
    }
}
