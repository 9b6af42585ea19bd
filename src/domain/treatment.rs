//! Treatments and their follow-up trees.
//!
//! A [`Treatment`] is a common header plus one of a closed set of kinds, and
//! owns its follow-up treatments outright. Follow-ups are attached by move, so
//! a treatment can never be shared between two parents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{PatientId, ProviderId, TreatmentId};

/// Fields shared by every treatment kind.
///
/// Patient and provider are relation handles, not ownership. They are fixed
/// at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentHeader {
    id: TreatmentId,
    diagnosis: String,
    patient: PatientId,
    provider: ProviderId,
}

impl TreatmentHeader {
    pub fn new(
        id: TreatmentId,
        diagnosis: impl Into<String>,
        patient: PatientId,
        provider: ProviderId,
    ) -> Self {
        Self {
            id,
            diagnosis: diagnosis.into(),
            patient,
            provider,
        }
    }

    pub fn id(&self) -> TreatmentId {
        self.id
    }

    pub fn diagnosis(&self) -> &str {
        &self.diagnosis
    }

    pub fn patient(&self) -> PatientId {
        self.patient
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }
}

/// Medication course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugTreatment {
    pub drug: String,
    pub dosage: f32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Doses per day
    pub frequency: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeryTreatment {
    pub surgery_date: NaiveDate,
    pub discharge_instructions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiologyTreatment {
    pub treatment_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysiotherapyTreatment {
    pub treatment_dates: Vec<NaiveDate>,
}

/// The concrete kinds of treatment the clinic records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreatmentKind {
    Drug(DrugTreatment),
    Surgery(SurgeryTreatment),
    Radiology(RadiologyTreatment),
    Physiotherapy(PhysiotherapyTreatment),
}

/// One treatment and the subtree of follow-ups it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Treatment {
    header: TreatmentHeader,
    kind: TreatmentKind,
    followups: Vec<Treatment>,
}

impl Treatment {
    /// Create a treatment with no follow-ups.
    pub fn new(header: TreatmentHeader, kind: TreatmentKind) -> Self {
        Self {
            header,
            kind,
            followups: Vec::new(),
        }
    }

    pub fn id(&self) -> TreatmentId {
        self.header.id
    }

    pub fn header(&self) -> &TreatmentHeader {
        &self.header
    }

    pub fn kind(&self) -> &TreatmentKind {
        &self.kind
    }

    /// Direct follow-ups in insertion order.
    pub fn followups(&self) -> &[Treatment] {
        &self.followups
    }

    /// Append a follow-up. The child moves into this treatment.
    pub fn add_followup(&mut self, child: Treatment) {
        self.followups.push(child);
    }

    /// Number of treatments in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Length of the longest root-to-leaf chain (a lone treatment has depth 1).
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, level)) = stack.pop() {
            max = max.max(level);
            for child in &node.followups {
                stack.push((child, level + 1));
            }
        }
        max
    }

    /// Pre-order iterator over this subtree.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Split into header, kind and follow-ups.
    pub fn into_parts(self) -> (TreatmentHeader, TreatmentKind, Vec<Treatment>) {
        (self.header, self.kind, self.followups)
    }
}

/// Parent-before-children iteration, siblings left to right.
pub struct PreOrder<'a> {
    stack: Vec<&'a Treatment>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Treatment;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // reversed so the leftmost child is popped first
        for child in current.followups.iter().rev() {
            self.stack.push(child);
        }
        Some(current)
    }
}
