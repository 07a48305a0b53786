//! Tenant-scoped specimen listing and search.
//!
//! Because the lifecycle stage is derived rather than stored, a status
//! filter cannot be pushed down to the store: the facade loads the
//! facility's full candidate set, derives the stage per item, filters,
//! sorts by creation timestamp (most recent first) and only then paginates.

use crate::model::{FacilityId, Program, SpecimenRecord};
use crate::status::stage_label;
use crate::store::SpecimenStore;
use crate::TrackerResult;
use std::sync::Arc;

/// A page window over an already-filtered result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// Apply the window to `items`, returning the page plus the total count
    /// before windowing.
    pub fn apply<T>(self, items: Vec<T>) -> (Vec<T>, usize) {
        let total = items.len();
        let page = items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect();
        (page, total)
    }
}

/// Listing parameters for [`QueryFacade::list_specimens`].
#[derive(Clone, Debug, Default)]
pub struct SpecimenQuery {
    /// Derived-stage label to keep, compared case-insensitively.
    pub status: Option<String>,
    /// Case-insensitive substring matched against the subject name, barcode
    /// and maternal/patient identifiers.
    pub search: Option<String>,
}

/// One page of specimens plus the filtered total.
#[derive(Clone, Debug)]
pub struct SpecimenPage {
    pub items: Vec<SpecimenRecord>,
    pub total: usize,
}

/// Paginated, filterable listing over one program's specimens.
pub struct QueryFacade {
    store: Arc<dyn SpecimenStore>,
    program: Program,
}

impl QueryFacade {
    pub fn new(store: Arc<dyn SpecimenStore>, program: Program) -> Self {
        Self { store, program }
    }

    /// List the facility's specimens, filtered and paginated.
    pub fn list_specimens(
        &self,
        facility: FacilityId,
        query: &SpecimenQuery,
        page: Page,
    ) -> TrackerResult<SpecimenPage> {
        let mut specimens = self.store.specimens_for_facility(facility)?;

        if let Some(status) = query.status.as_deref() {
            specimens.retain(|s| stage_label(self.program, s).eq_ignore_ascii_case(status));
        }

        if let Some(term) = query.search.as_deref() {
            let needle = term.to_lowercase();
            specimens.retain(|s| matches_search(s, &needle));
        }

        sort_newest_first(&mut specimens);
        let (items, total) = page.apply(specimens);
        Ok(SpecimenPage { items, total })
    }
}

/// Order by creation timestamp descending, position as the tiebreak so the
/// ordering is stable for specimens created in the same instant.
pub(crate) fn sort_newest_first(specimens: &mut [SpecimenRecord]) {
    specimens.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(b.position.cmp(&a.position))
    });
}

fn matches_search(specimen: &SpecimenRecord, needle: &str) -> bool {
    let subject = &specimen.subject;
    let fields = [
        Some(subject.name.as_str()),
        subject.barcode.as_deref(),
        subject.maternal_id.as_deref(),
        subject.patient_id.as_deref(),
    ];
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}
