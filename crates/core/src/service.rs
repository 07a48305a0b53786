//! The operation facade the presentation layer consumes.
//!
//! `TrackerService` resolves the logical store for the requested program,
//! wires the workflow for the operation, and clamps caller pagination
//! through the startup-resolved [`CoreConfig`]. It holds no specimen state
//! of its own; every call is one synchronous pass through a workflow.

use crate::allocator::BatchAllocator;
use crate::analytics::{AnalyticsAggregator, DateRange, TimeSeriesPoint};
use crate::collection::CollectionWorkflow;
use crate::config::CoreConfig;
use crate::model::{
    FacilityId, FacilityRef, Program, SenderDetails, SpecimenDraft, SpecimenId, SpecimenRecord,
};
use crate::packaging::{PackageReceipt, PackagedListing, PackagingWorkflow};
use crate::query::{QueryFacade, SpecimenPage, SpecimenQuery};
use crate::store::{SpecimenStore, StorePool};
use crate::TrackerResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Specimen-tracking operations over both programs - no API concerns.
#[derive(Clone)]
pub struct TrackerService {
    pool: Arc<StorePool>,
    cfg: Arc<CoreConfig>,
}

impl TrackerService {
    pub fn new(pool: Arc<StorePool>, cfg: Arc<CoreConfig>) -> Self {
        Self { pool, cfg }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    fn store(&self, program: Program) -> TrackerResult<Arc<dyn SpecimenStore>> {
        self.pool.store(program)
    }

    /// Create a specimen in the facility's open batch (§ batch-allocation
    /// transaction).
    pub fn create_specimen(
        &self,
        program: Program,
        facility: &FacilityRef,
        sender: &SenderDetails,
        draft: SpecimenDraft,
    ) -> TrackerResult<SpecimenRecord> {
        BatchAllocator::new(self.store(program)?).create_specimen(facility, sender, draft)
    }

    /// Record collection of a specimen.
    pub fn collect(
        &self,
        program: Program,
        facility: FacilityId,
        specimen: SpecimenId,
        collected_at: Option<DateTime<Utc>>,
        barcode: Option<String>,
    ) -> TrackerResult<SpecimenRecord> {
        CollectionWorkflow::new(self.store(program)?).collect(
            facility,
            specimen,
            collected_at,
            barcode,
        )
    }

    /// Delete a specimen that has not progressed past creation.
    pub fn delete_specimen(
        &self,
        program: Program,
        facility: FacilityId,
        specimen: SpecimenId,
    ) -> TrackerResult<()> {
        CollectionWorkflow::new(self.store(program)?).delete_request(facility, specimen)
    }

    /// Paginated, filterable listing of the facility's specimens.
    pub fn list_specimens(
        &self,
        program: Program,
        facility: FacilityId,
        query: &SpecimenQuery,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> TrackerResult<SpecimenPage> {
        QueryFacade::new(self.store(program)?, program).list_specimens(
            facility,
            query,
            self.cfg.page(limit, offset),
        )
    }

    /// Group collected specimens into a named transport package.
    pub fn package_specimens(
        &self,
        program: Program,
        facility: FacilityId,
        label: &str,
        specimens: &[SpecimenId],
    ) -> TrackerResult<PackageReceipt> {
        PackagingWorkflow::new(self.store(program)?).package_specimens(facility, label, specimens)
    }

    /// Collected, unpackaged specimens.
    pub fn list_ready_for_packaging(
        &self,
        program: Program,
        facility: FacilityId,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> TrackerResult<SpecimenPage> {
        PackagingWorkflow::new(self.store(program)?)
            .list_ready_for_packaging(facility, self.cfg.page(limit, offset))
    }

    /// Packaged specimens plus the facility's known package labels.
    pub fn list_packaged(
        &self,
        program: Program,
        facility: FacilityId,
        label: Option<&str>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> TrackerResult<PackagedListing> {
        PackagingWorkflow::new(self.store(program)?).list_packaged(
            facility,
            label,
            self.cfg.page(limit, offset),
        )
    }

    /// Dashboard pending/collected series.
    pub fn time_series(
        &self,
        program: Program,
        facility: FacilityId,
        range: DateRange,
    ) -> TrackerResult<Vec<TimeSeriesPoint>> {
        AnalyticsAggregator::new(self.store(program)?).time_series(facility, range)
    }
}
