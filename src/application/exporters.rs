//! Treatment exporters: wire DTOs and terminal trees.

use termtree::Tree;

use crate::application::dto::{TreatmentDetailsDto, TreatmentDto};
use crate::domain::{
    DrugTreatment, PhysiotherapyTreatment, RadiologyTreatment, SurgeryTreatment, TreatmentExporter,
    TreatmentHeader,
};

/// Exports treatments to [`TreatmentDto`]s, follow-ups nested in
/// `followup_treatments`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreatmentDtoExporter;

impl TreatmentDtoExporter {
    fn dto(header: &TreatmentHeader, details: TreatmentDetailsDto) -> TreatmentDto {
        TreatmentDto {
            id: header.id(),
            patient_id: header.patient(),
            provider_id: header.provider(),
            diagnosis: header.diagnosis().to_string(),
            details,
            followup_treatments: Vec::new(),
        }
    }
}

impl TreatmentExporter for TreatmentDtoExporter {
    type Output = TreatmentDto;

    fn export_drug(&mut self, header: &TreatmentHeader, drug: &DrugTreatment) -> TreatmentDto {
        Self::dto(
            header,
            TreatmentDetailsDto::Drug {
                drug: drug.drug.clone(),
                dosage: drug.dosage,
                start_date: drug.start_date,
                end_date: drug.end_date,
                frequency: drug.frequency,
            },
        )
    }

    fn export_surgery(
        &mut self,
        header: &TreatmentHeader,
        surgery: &SurgeryTreatment,
    ) -> TreatmentDto {
        Self::dto(
            header,
            TreatmentDetailsDto::Surgery {
                surgery_date: surgery.surgery_date,
                discharge_instructions: surgery.discharge_instructions.clone(),
            },
        )
    }

    fn export_radiology(
        &mut self,
        header: &TreatmentHeader,
        radiology: &RadiologyTreatment,
    ) -> TreatmentDto {
        Self::dto(
            header,
            TreatmentDetailsDto::Radiology {
                treatment_dates: radiology.treatment_dates.clone(),
            },
        )
    }

    fn export_physiotherapy(
        &mut self,
        header: &TreatmentHeader,
        physiotherapy: &PhysiotherapyTreatment,
    ) -> TreatmentDto {
        Self::dto(
            header,
            TreatmentDetailsDto::Physiotherapy {
                treatment_dates: physiotherapy.treatment_dates.clone(),
            },
        )
    }

    fn attach_followups(&mut self, parent: &mut TreatmentDto, followups: Vec<TreatmentDto>) {
        parent.followup_treatments = followups;
    }
}

/// Exports treatments to a printable tree, one line per treatment.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeDisplayExporter;

impl TreeDisplayExporter {
    fn line(header: &TreatmentHeader, kind: &str, detail: String) -> Tree<String> {
        Tree::new(format!(
            "[{kind}] {}: {detail} ({})",
            header.diagnosis(),
            header.id()
        ))
    }
}

fn join_dates(dates: &[chrono::NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TreatmentExporter for TreeDisplayExporter {
    type Output = Tree<String>;

    fn export_drug(&mut self, header: &TreatmentHeader, drug: &DrugTreatment) -> Tree<String> {
        Self::line(
            header,
            "drug",
            format!(
                "{} {} x{}/day, {} to {}",
                drug.drug, drug.dosage, drug.frequency, drug.start_date, drug.end_date
            ),
        )
    }

    fn export_surgery(
        &mut self,
        header: &TreatmentHeader,
        surgery: &SurgeryTreatment,
    ) -> Tree<String> {
        Self::line(header, "surgery", format!("on {}", surgery.surgery_date))
    }

    fn export_radiology(
        &mut self,
        header: &TreatmentHeader,
        radiology: &RadiologyTreatment,
    ) -> Tree<String> {
        Self::line(header, "radiology", join_dates(&radiology.treatment_dates))
    }

    fn export_physiotherapy(
        &mut self,
        header: &TreatmentHeader,
        physiotherapy: &PhysiotherapyTreatment,
    ) -> Tree<String> {
        Self::line(header, "physiotherapy", join_dates(&physiotherapy.treatment_dates))
    }

    fn attach_followups(&mut self, parent: &mut Tree<String>, followups: Vec<Tree<String>>) {
        for child in followups {
            parent.push(child);
        }
    }
}
