//! Storage contract for the tracking engine.
//!
//! The core never talks to a persistence engine directly; every workflow
//! goes through the [`SpecimenStore`] trait. The contract deliberately
//! bundles the read-modify-write sequences that are racy when split apart:
//!
//! - [`SpecimenStore::find_or_create_open_batch`] is a transactional
//!   find-or-insert, so two concurrent first submissions for a facility
//!   cannot create two open batches;
//! - [`SpecimenStore::insert_specimen`] computes the next position and
//!   inserts within the same critical section, so two concurrent creations
//!   cannot share a slot;
//! - [`SpecimenStore::assign_package`] checks and stamps the whole specimen
//!   set atomically, so a specimen cannot land in two packages.
//!
//! Implementations must serialize those three operations; read paths need
//! only the engine's normal read consistency.

mod memory;
mod pool;

pub use memory::MemoryStore;
pub use pool::StorePool;

use crate::model::{
    BatchId, BatchRecord, FacilityId, FacilityRef, SenderDetails, SpecimenDraft, SpecimenId,
    SpecimenRecord,
};
use crate::TrackerResult;
use lst_types::{BatchPosition, NonEmptyText};

/// Repository contract over batch, specimen and package state, scoped by
/// facility.
pub trait SpecimenStore: Send + Sync {
    /// Return the facility's open batch, creating one seeded from
    /// `facility` and `sender` if none exists. Atomic per facility.
    fn find_or_create_open_batch(
        &self,
        facility: &FacilityRef,
        sender: &SenderDetails,
    ) -> TrackerResult<BatchRecord>;

    /// Fetch a batch by id.
    fn batch(&self, id: BatchId) -> TrackerResult<Option<BatchRecord>>;

    /// The position the next specimen in `batch` would receive.
    ///
    /// Advisory: the authoritative assignment happens inside
    /// [`SpecimenStore::insert_specimen`]. Fails with
    /// [`crate::TrackerError::BatchFull`] once the capacity bound is
    /// reached and with [`crate::TrackerError::NotFound`] for an unknown
    /// batch.
    fn next_position(&self, batch: BatchId) -> TrackerResult<BatchPosition>;

    /// Insert a new specimen into `batch`, assigning the next position
    /// within the same critical section. Fails with `BatchFull` when the
    /// batch is at capacity, leaving the batch unchanged, and with
    /// `InvalidState` when the batch has already been dispatched.
    fn insert_specimen(
        &self,
        batch: BatchId,
        draft: SpecimenDraft,
    ) -> TrackerResult<SpecimenRecord>;

    /// Fetch a specimen by id.
    fn specimen(&self, id: SpecimenId) -> TrackerResult<Option<SpecimenRecord>>;

    /// Replace a specimen record. Fails with `NotFound` if it no longer
    /// exists.
    fn update_specimen(&self, record: &SpecimenRecord) -> TrackerResult<()>;

    /// Remove a specimen. Fails with `NotFound` if it does not exist. State
    /// checks (the forward-only rule) belong to the collection workflow.
    fn delete_specimen(&self, id: SpecimenId) -> TrackerResult<()>;

    /// All specimens owned by `facility`, in no particular order. Callers
    /// sort and paginate; the full candidate set is needed for derived-stage
    /// filtering and for the dashboard aggregation.
    fn specimens_for_facility(&self, facility: FacilityId) -> TrackerResult<Vec<SpecimenRecord>>;

    /// Stamp every listed specimen with `label`, all-or-nothing.
    ///
    /// Verifies under one critical section that each specimen exists within
    /// the facility scope, is collected, and is not already packaged. Any
    /// failure leaves every specimen unmodified. Returns the stamped
    /// records.
    fn assign_package(
        &self,
        facility: FacilityId,
        ids: &[SpecimenId],
        label: &NonEmptyText,
    ) -> TrackerResult<Vec<SpecimenRecord>>;

    /// Release resources held by the store. Called once by
    /// [`StorePool::shutdown`]; the default is a no-op for stores with
    /// nothing to flush.
    fn shutdown(&self) -> TrackerResult<()> {
        Ok(())
    }
}
