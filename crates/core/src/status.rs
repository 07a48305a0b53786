//! Lifecycle stage derivation.
//!
//! A specimen's processing stage is never stored; it is computed from the
//! event timestamps on the record, with the rules evaluated in priority
//! order (first matching rule wins). The two testing programs have
//! independent stage families because the viral-load pool flows through
//! packaging while EID specimens do not.
//!
//! Everything in this module is deterministic and side-effect free so the
//! rule precedence can be unit tested without storage.

use crate::model::{Program, SpecimenRecord};
use serde::Serialize;

/// Display stage of an early-infant-diagnosis specimen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EidStage {
    /// Created, not yet collected.
    Pending,
    /// Collected, not yet received by the central lab.
    Collected,
    /// Received, testing not complete.
    Processing,
    /// Testing complete.
    Completed,
}

impl EidStage {
    pub fn label(self) -> &'static str {
        match self {
            EidStage::Pending => "Pending",
            EidStage::Collected => "Collected",
            EidStage::Processing => "Processing",
            EidStage::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for EidStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Display stage of a viral-load specimen in the packaging pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VlStage {
    /// Created, not yet collected.
    PendingCollection,
    /// Collected, not yet received by the central lab; eligible for
    /// packaging while unpackaged.
    ReadyForPackaging,
    /// Received, result not yet verified.
    Processing,
    /// Received and verified.
    Completed,
}

impl VlStage {
    pub fn label(self) -> &'static str {
        match self {
            VlStage::PendingCollection => "PendingCollection",
            VlStage::ReadyForPackaging => "ReadyForPackaging",
            VlStage::Processing => "Processing",
            VlStage::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for VlStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Derive the stage of an EID specimen from its event timestamps.
pub fn eid_stage(specimen: &SpecimenRecord) -> EidStage {
    if specimen.collected_at.is_none() {
        EidStage::Pending
    } else if specimen.received_at.is_none() {
        EidStage::Collected
    } else if specimen.tested_at.is_none() {
        EidStage::Processing
    } else {
        EidStage::Completed
    }
}

/// Derive the stage of a viral-load specimen from its event timestamps.
pub fn vl_stage(specimen: &SpecimenRecord) -> VlStage {
    if specimen.collected_at.is_none() {
        VlStage::PendingCollection
    } else if specimen.received_at.is_none() {
        VlStage::ReadyForPackaging
    } else if specimen.verified_at.is_none() {
        VlStage::Processing
    } else {
        VlStage::Completed
    }
}

/// The display label of a specimen's derived stage for the given program.
///
/// Status filters compare against these labels case-insensitively, so they
/// are the one wire-visible representation of the two stage families.
pub fn stage_label(program: Program, specimen: &SpecimenRecord) -> &'static str {
    match program {
        Program::Eid => eid_stage(specimen).label(),
        Program::ViralLoad => vl_stage(specimen).label(),
    }
}
