//! Wire representations of clinic records.
//!
//! These are what the REST API emits and what the bulk upload accepts.
//! Field names are camelCase on the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    DrugTreatment, Patient, PatientId, PhysiotherapyTreatment, Provider, ProviderId,
    RadiologyTreatment, SurgeryTreatment, Treatment, TreatmentHeader, TreatmentId, TreatmentKind,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDto {
    pub id: PatientId,
    pub name: String,
    pub dob: NaiveDate,
    #[serde(default)]
    pub treatments: Vec<TreatmentDto>,
}

impl PatientDto {
    pub fn into_patient(self) -> Patient {
        Patient::new(self.id, self.name, self.dob)
    }
}

impl From<&Patient> for PatientDto {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name.clone(),
            dob: patient.dob,
            treatments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDto {
    pub id: ProviderId,
    pub npi: String,
    pub name: String,
    #[serde(default)]
    pub treatments: Vec<TreatmentDto>,
}

impl ProviderDto {
    pub fn into_provider(self) -> Provider {
        Provider::new(self.id, self.npi, self.name)
    }
}

impl From<&Provider> for ProviderDto {
    fn from(provider: &Provider) -> Self {
        Self {
            id: provider.id,
            npi: provider.npi.clone(),
            name: provider.name.clone(),
            treatments: Vec::new(),
        }
    }
}

/// Kind-specific treatment fields, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum TreatmentDetailsDto {
    Drug {
        drug: String,
        dosage: f32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        frequency: i32,
    },
    Surgery {
        surgery_date: NaiveDate,
        discharge_instructions: String,
    },
    Radiology {
        treatment_dates: Vec<NaiveDate>,
    },
    Physiotherapy {
        treatment_dates: Vec<NaiveDate>,
    },
}

impl From<TreatmentDetailsDto> for TreatmentKind {
    fn from(details: TreatmentDetailsDto) -> Self {
        match details {
            TreatmentDetailsDto::Drug {
                drug,
                dosage,
                start_date,
                end_date,
                frequency,
            } => TreatmentKind::Drug(DrugTreatment {
                drug,
                dosage,
                start_date,
                end_date,
                frequency,
            }),
            TreatmentDetailsDto::Surgery {
                surgery_date,
                discharge_instructions,
            } => TreatmentKind::Surgery(SurgeryTreatment {
                surgery_date,
                discharge_instructions,
            }),
            TreatmentDetailsDto::Radiology { treatment_dates } => {
                TreatmentKind::Radiology(RadiologyTreatment { treatment_dates })
            }
            TreatmentDetailsDto::Physiotherapy { treatment_dates } => {
                TreatmentKind::Physiotherapy(PhysiotherapyTreatment { treatment_dates })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentDto {
    pub id: TreatmentId,
    pub patient_id: PatientId,
    pub provider_id: ProviderId,
    pub diagnosis: String,
    #[serde(flatten)]
    pub details: TreatmentDetailsDto,
    #[serde(default)]
    pub followup_treatments: Vec<TreatmentDto>,
}

impl TreatmentDto {
    /// Build the treatment tree this document describes.
    pub fn into_treatment(self) -> Treatment {
        let header =
            TreatmentHeader::new(self.id, self.diagnosis, self.patient_id, self.provider_id);
        let mut treatment = Treatment::new(header, self.details.into());
        for followup in self.followup_treatments {
            treatment.add_followup(followup.into_treatment());
        }
        treatment
    }

    /// Every treatment id in this document, pre-order.
    pub fn ids(&self) -> Vec<TreatmentId> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(dto) = stack.pop() {
            ids.push(dto.id);
            stack.extend(dto.followup_treatments.iter().rev());
        }
        ids
    }
}
