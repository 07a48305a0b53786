//! # LST Core
//!
//! Specimen lifecycle and batch/package allocation engine for the
//! laboratory specimen-tracking system. Two parallel testing programs are
//! tracked: early-infant diagnosis (EID) and viral load (VL).
//!
//! This crate contains pure domain operations:
//! - Batch allocation with capacity-bounded position counters
//! - Stage derivation from event timestamps (no stored status field)
//! - Collection with the forward-only deletion rule
//! - Transport packaging under one-package-per-specimen
//! - Dashboard time-series aggregation and tenant-scoped listing
//!
//! **No API concerns**: authentication, HTTP servers and wire formats
//! belong in `api-rest` and `api-shared`. Persistence is reached only
//! through the [`store::SpecimenStore`] contract.

pub mod allocator;
pub mod analytics;
pub mod collection;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod packaging;
pub mod query;
pub mod service;
pub mod status;
pub mod store;

pub use config::CoreConfig;
pub use error::{TrackerError, TrackerResult};
pub use model::{
    BatchId, BatchRecord, FacilityId, FacilityRef, PcrRound, Program, SenderDetails,
    SpecimenDraft, SpecimenId, SpecimenKind, SpecimenRecord, SubjectDetails, TestResult,
};
pub use service::TrackerService;
pub use status::{eid_stage, stage_label, vl_stage, EidStage, VlStage};
pub use store::{MemoryStore, SpecimenStore, StorePool};
