//! Open-batch lifecycle and bounded position allocation.
//!
//! Incoming specimens attach to their facility's single open batch,
//! creating one lazily on first use. Positions within a batch are assigned
//! monotonically from 1 up to the capacity bound; hitting the bound is a
//! business error that signals the facility to dispatch the batch, not a
//! condition the allocator retries.

use crate::model::{
    BatchId, BatchRecord, FacilityRef, SenderDetails, SpecimenDraft, SpecimenRecord,
};
use crate::store::SpecimenStore;
use crate::TrackerResult;
use lst_types::BatchPosition;
use std::sync::Arc;

/// Allocates specimens into capacity-bounded batches.
pub struct BatchAllocator {
    store: Arc<dyn SpecimenStore>,
}

impl BatchAllocator {
    pub fn new(store: Arc<dyn SpecimenStore>) -> Self {
        Self { store }
    }

    /// The facility's open batch, created and seeded with the facility and
    /// sender details if none exists.
    pub fn open_batch(
        &self,
        facility: &FacilityRef,
        sender: &SenderDetails,
    ) -> TrackerResult<BatchRecord> {
        self.store.find_or_create_open_batch(facility, sender)
    }

    /// The position the next specimen in `batch` would receive.
    ///
    /// # Errors
    ///
    /// `BatchFull` when the bound would be exceeded; `NotFound` for an
    /// unknown batch.
    pub fn next_position(&self, batch: BatchId) -> TrackerResult<BatchPosition> {
        self.store.next_position(batch)
    }

    /// The batch-allocation transaction: attach a new specimen to the
    /// facility's open batch, assigning the next free position.
    pub fn create_specimen(
        &self,
        facility: &FacilityRef,
        sender: &SenderDetails,
        draft: SpecimenDraft,
    ) -> TrackerResult<SpecimenRecord> {
        let batch = self.open_batch(facility, sender)?;
        let specimen = self.store.insert_specimen(batch.id, draft)?;
        tracing::info!(
            facility = %facility.id,
            batch = %batch.id,
            specimen = %specimen.id,
            position = %specimen.position,
            "specimen created"
        );
        Ok(specimen)
    }
}
