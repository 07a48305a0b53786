//! Transport-package workflow.
//!
//! Collected specimens are grouped into caller-named packages for transport
//! to the central lab. Membership is exclusive (one package per specimen,
//! ever) and append-only: there is no un-packaging operation, so joining a
//! package permanently removes a specimen from the ready pool. Assignment
//! is all-or-nothing across the requested set.

use crate::model::{FacilityId, SpecimenId};
use crate::query::{sort_newest_first, Page, SpecimenPage};
use crate::store::SpecimenStore;
use crate::{TrackerError, TrackerResult};
use lst_types::NonEmptyText;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Confirmation of a successful package assignment.
#[derive(Clone, Debug)]
pub struct PackageReceipt {
    pub label: NonEmptyText,
    pub specimens: Vec<SpecimenId>,
}

/// One page of packaged specimens plus the distinct labels known to the
/// facility, for populating the package filter.
#[derive(Clone, Debug)]
pub struct PackagedListing {
    pub page: SpecimenPage,
    pub labels: Vec<String>,
}

/// Groups collected specimens into transport packages.
pub struct PackagingWorkflow {
    store: Arc<dyn SpecimenStore>,
}

impl PackagingWorkflow {
    pub fn new(store: Arc<dyn SpecimenStore>) -> Self {
        Self { store }
    }

    /// Assign every listed specimen to the package `label`.
    ///
    /// All-or-nothing: each specimen must exist within the facility scope,
    /// be collected, and be unpackaged; any failure leaves every specimen
    /// unmodified.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty label or empty id list, `NotFound` for
    /// an id outside the tenant scope, `AlreadyPackaged` when a specimen is
    /// already a member of any package.
    pub fn package_specimens(
        &self,
        facility: FacilityId,
        label: &str,
        specimens: &[SpecimenId],
    ) -> TrackerResult<PackageReceipt> {
        let label = NonEmptyText::new(label)
            .map_err(|_| TrackerError::InvalidInput("package label cannot be empty".into()))?;
        if specimens.is_empty() {
            return Err(TrackerError::InvalidInput(
                "at least one specimen is required".into(),
            ));
        }

        let stamped = self.store.assign_package(facility, specimens, &label)?;
        tracing::info!(
            %facility,
            package = %label,
            count = stamped.len(),
            "specimens packaged"
        );
        Ok(PackageReceipt {
            label,
            specimens: stamped.into_iter().map(|s| s.id).collect(),
        })
    }

    /// Specimens that are collected and not yet a member of any package.
    pub fn list_ready_for_packaging(
        &self,
        facility: FacilityId,
        page: Page,
    ) -> TrackerResult<SpecimenPage> {
        let mut specimens = self.store.specimens_for_facility(facility)?;
        specimens.retain(|s| s.is_collected() && !s.is_packaged());
        sort_newest_first(&mut specimens);
        let (items, total) = page.apply(specimens);
        Ok(SpecimenPage { items, total })
    }

    /// Packaged specimens, optionally narrowed to one label, plus the
    /// distinct set of labels known to the facility.
    pub fn list_packaged(
        &self,
        facility: FacilityId,
        label: Option<&str>,
        page: Page,
    ) -> TrackerResult<PackagedListing> {
        let mut specimens = self.store.specimens_for_facility(facility)?;
        specimens.retain(|s| s.is_packaged());

        let labels: BTreeSet<String> = specimens
            .iter()
            .filter_map(|s| s.package_label.as_ref())
            .map(|l| l.as_str().to_owned())
            .collect();

        if let Some(label) = label {
            specimens.retain(|s| {
                s.package_label
                    .as_ref()
                    .is_some_and(|l| l.as_str() == label)
            });
        }

        sort_newest_first(&mut specimens);
        let (items, total) = page.apply(specimens);
        Ok(PackagedListing {
            page: SpecimenPage { items, total },
            labels: labels.into_iter().collect(),
        })
    }
}
