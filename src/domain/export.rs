//! Polymorphic export of treatment trees.
//!
//! A [`TreatmentExporter`] knows how to turn one treatment of each kind into
//! some output, and how to hang already-exported follow-ups onto a parent's
//! output. [`Treatment::export`] drives the traversal, so exporters never see
//! the tree structure.

use std::collections::HashSet;

use crate::domain::error::{DomainResult, StructuralViolation};
use crate::domain::ids::TreatmentId;
use crate::domain::treatment::{
    DrugTreatment, PhysiotherapyTreatment, RadiologyTreatment, SurgeryTreatment, Treatment,
    TreatmentHeader, TreatmentKind,
};

/// Follow-up chains longer than this are rejected during export.
pub const MAX_FOLLOWUP_DEPTH: usize = 256;

/// Converts single treatments into an output representation.
///
/// Each `export_*` method sees one node only, never its follow-ups.
pub trait TreatmentExporter {
    type Output;

    fn export_drug(&mut self, header: &TreatmentHeader, drug: &DrugTreatment) -> Self::Output;

    fn export_surgery(
        &mut self,
        header: &TreatmentHeader,
        surgery: &SurgeryTreatment,
    ) -> Self::Output;

    fn export_radiology(
        &mut self,
        header: &TreatmentHeader,
        radiology: &RadiologyTreatment,
    ) -> Self::Output;

    fn export_physiotherapy(
        &mut self,
        header: &TreatmentHeader,
        physiotherapy: &PhysiotherapyTreatment,
    ) -> Self::Output;

    /// Attach the exported follow-ups to their parent's output.
    fn attach_followups(&mut self, parent: &mut Self::Output, followups: Vec<Self::Output>);
}

/// Tracks which treatments a traversal has entered.
#[derive(Debug, Default)]
struct TraversalGuard {
    visited: HashSet<TreatmentId>,
    depth: usize,
    root: Option<TreatmentId>,
}

impl TraversalGuard {
    fn enter(&mut self, id: TreatmentId) -> DomainResult<()> {
        let root = *self.root.get_or_insert(id);
        if !self.visited.insert(id) {
            return Err(StructuralViolation::Cycle(id).into());
        }
        self.depth += 1;
        if self.depth > MAX_FOLLOWUP_DEPTH {
            return Err(StructuralViolation::TooDeep {
                root,
                limit: MAX_FOLLOWUP_DEPTH,
            }
            .into());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

impl Treatment {
    /// Export this treatment and every follow-up below it.
    ///
    /// Pre-order: a node is exported before any of its follow-ups, and every
    /// node exactly once. Fails with a structural violation if the same
    /// treatment id occurs twice in the subtree or the chain is too deep.
    pub fn export<E: TreatmentExporter>(&self, exporter: &mut E) -> DomainResult<E::Output> {
        let mut guard = TraversalGuard::default();
        self.export_guarded(exporter, &mut guard)
    }

    /// Export each direct follow-up, in collection order.
    pub fn export_followups<E: TreatmentExporter>(
        &self,
        exporter: &mut E,
    ) -> DomainResult<Vec<E::Output>> {
        let mut guard = TraversalGuard::default();
        guard.enter(self.id())?;
        self.export_followups_guarded(exporter, &mut guard)
    }

    fn export_guarded<E: TreatmentExporter>(
        &self,
        exporter: &mut E,
        guard: &mut TraversalGuard,
    ) -> DomainResult<E::Output> {
        guard.enter(self.id())?;
        let header = self.header();
        let mut output = match self.kind() {
            TreatmentKind::Drug(drug) => exporter.export_drug(header, drug),
            TreatmentKind::Surgery(surgery) => exporter.export_surgery(header, surgery),
            TreatmentKind::Radiology(radiology) => exporter.export_radiology(header, radiology),
            TreatmentKind::Physiotherapy(physio) => exporter.export_physiotherapy(header, physio),
        };
        let followups = self.export_followups_guarded(exporter, guard)?;
        exporter.attach_followups(&mut output, followups);
        guard.leave();
        Ok(output)
    }

    fn export_followups_guarded<E: TreatmentExporter>(
        &self,
        exporter: &mut E,
        guard: &mut TraversalGuard,
    ) -> DomainResult<Vec<E::Output>> {
        self.followups()
            .iter()
            .map(|child| child.export_guarded(exporter, guard))
            .collect()
    }
}
