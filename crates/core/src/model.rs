//! Domain records for the specimen-tracking engine.
//!
//! Responsibilities:
//! - Identifier newtypes for the three record families (facility, batch,
//!   specimen), so tenant scoping mistakes fail to compile
//! - The persisted shapes of batches and specimens
//! - Clinical enumerations shared by both testing programs
//!
//! A specimen's lifecycle stage is intentionally absent here: it is derived
//! from the event timestamps by [`crate::status`], never stored.

use chrono::{DateTime, Utc};
use lst_types::{BatchPosition, NonEmptyText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two parallel testing programs tracked by the system.
///
/// Each program has its own logical store and its own derived-stage family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Program {
    /// Early-infant diagnosis (DBS card specimens).
    Eid,
    /// Viral-load monitoring (plasma specimens, packaged for transport).
    ViralLoad,
}

impl Program {
    /// All programs, in a stable order. Used when building one store per
    /// logical database at startup.
    pub const ALL: [Program; 2] = [Program::Eid, Program::ViralLoad];

    pub fn as_str(self) -> &'static str {
        match self {
            Program::Eid => "eid",
            Program::ViralLoad => "viral-load",
        }
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Program {
    type Err = crate::TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "eid" => Ok(Program::Eid),
            "vl" | "viral-load" => Ok(Program::ViralLoad),
            other => Err(crate::TrackerError::InvalidInput(format!(
                "unknown program \"{other}\" (expected \"eid\" or \"vl\")"
            ))),
        }
    }
}

/// Identifier of a facility (the tenant boundary).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacilityId(Uuid);

impl FacilityId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for FacilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a specimen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecimenId(Uuid);

impl SpecimenId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SpecimenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A facility reference carrying the seed fields a new batch is stamped
/// with. The id alone scopes queries; name and district travel with the
/// batch so dispatch paperwork does not need a facility lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityRef {
    pub id: FacilityId,
    pub name: NonEmptyText,
    pub district: Option<String>,
}

/// Contact details of the person submitting a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderDetails {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Subject identifiers attached to a specimen.
///
/// EID specimens carry the infant's name and the maternal identifier; VL
/// specimens carry the patient/ART identifier. The barcode is the physical
/// label and may be corrected at collection time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDetails {
    pub name: NonEmptyText,
    pub barcode: Option<String>,
    pub maternal_id: Option<String>,
    pub patient_id: Option<String>,
}

/// Physical form of a specimen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecimenKind {
    DbsCard,
    PlasmaTube,
}

impl SpecimenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SpecimenKind::DbsCard => "dbs-card",
            SpecimenKind::PlasmaTube => "plasma-tube",
        }
    }
}

impl std::str::FromStr for SpecimenKind {
    type Err = crate::TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dbs-card" | "dbs" => Ok(SpecimenKind::DbsCard),
            "plasma-tube" | "plasma" => Ok(SpecimenKind::PlasmaTube),
            other => Err(crate::TrackerError::InvalidInput(format!(
                "unknown specimen kind \"{other}\""
            ))),
        }
    }
}

/// Which sequential viral-PCR test an EID specimen corresponds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PcrRound {
    First,
    Second,
    Third,
    NonRoutine,
}

impl PcrRound {
    pub fn as_str(self) -> &'static str {
        match self {
            PcrRound::First => "first",
            PcrRound::Second => "second",
            PcrRound::Third => "third",
            PcrRound::NonRoutine => "non-routine",
        }
    }
}

impl std::str::FromStr for PcrRound {
    type Err = crate::TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "first" => Ok(PcrRound::First),
            "second" => Ok(PcrRound::Second),
            "third" => Ok(PcrRound::Third),
            "non-routine" => Ok(PcrRound::NonRoutine),
            other => Err(crate::TrackerError::InvalidInput(format!(
                "unknown PCR round \"{other}\""
            ))),
        }
    }
}

/// Outcome recorded once the central lab completes testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestResult {
    Positive,
    Negative,
    Indeterminate,
    Failed,
}

impl TestResult {
    pub fn as_str(self) -> &'static str {
        match self {
            TestResult::Positive => "positive",
            TestResult::Negative => "negative",
            TestResult::Indeterminate => "indeterminate",
            TestResult::Failed => "failed",
        }
    }
}

/// A batch: the facility-level grouping of specimens submitted together for
/// transport and testing.
///
/// A batch is open while `dispatched_at` is unset. Dispatching happens
/// through an administrative action outside this crate and is terminal with
/// respect to new specimen attachment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: BatchId,
    pub facility: FacilityRef,
    pub sender: SenderDetails,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
}

impl BatchRecord {
    pub fn is_open(&self) -> bool {
        self.dispatched_at.is_none()
    }
}

/// A single diagnostic sample and its event history.
///
/// Event timestamps, once set, are never cleared by normal workflow
/// operations; the forward-only deletion rule in the collection workflow is
/// what enforces that. `facility_id` is denormalised from the owning batch
/// at insert time so tenant checks do not need a join.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecimenRecord {
    pub id: SpecimenId,
    pub batch_id: BatchId,
    pub facility_id: FacilityId,
    pub position: BatchPosition,
    pub subject: SubjectDetails,
    pub kind: SpecimenKind,
    pub pcr_round: Option<PcrRound>,
    pub created_at: DateTime<Utc>,
    pub collected_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub tested_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub result: Option<TestResult>,
    pub package_label: Option<NonEmptyText>,
}

impl SpecimenRecord {
    pub fn is_collected(&self) -> bool {
        self.collected_at.is_some()
    }

    pub fn is_packaged(&self) -> bool {
        self.package_label.is_some()
    }
}

/// The caller-supplied part of a new specimen.
///
/// Batch id, position, facility and creation timestamp are all assigned by
/// the store inside the batch-allocation transaction.
#[derive(Clone, Debug)]
pub struct SpecimenDraft {
    pub subject: SubjectDetails,
    pub kind: SpecimenKind,
    pub pcr_round: Option<PcrRound>,
    /// Creation timestamp override; defaults to now. Used by data imports
    /// and tests.
    pub created_at: Option<DateTime<Utc>>,
}
