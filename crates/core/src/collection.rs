//! Sample-collection workflow.
//!
//! Records the "sample collected" event and enforces the forward-only
//! lifecycle rule: a specimen can be removed only while nothing downstream
//! of creation has happened to it. Collection is last-write-wins: a repeat
//! call overwrites the previous timestamp, which mirrors the field
//! behaviour this system inherited (clinics re-scan a card to correct the
//! collection time or barcode).

use crate::model::{FacilityId, SpecimenId, SpecimenRecord};
use crate::store::SpecimenStore;
use crate::{TrackerError, TrackerResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Collection and deletion operations over one program's specimens.
pub struct CollectionWorkflow {
    store: Arc<dyn SpecimenStore>,
}

impl CollectionWorkflow {
    pub fn new(store: Arc<dyn SpecimenStore>) -> Self {
        Self { store }
    }

    fn owned_specimen(
        &self,
        facility: FacilityId,
        specimen: SpecimenId,
    ) -> TrackerResult<SpecimenRecord> {
        let record = self
            .store
            .specimen(specimen)?
            .ok_or(TrackerError::NotFound)?;
        if record.facility_id != facility {
            return Err(TrackerError::TenantMismatch);
        }
        Ok(record)
    }

    /// Record that the sample was collected.
    ///
    /// Sets the collected timestamp (defaulting to now) and optionally
    /// overwrites the subject barcode. Re-invocation overwrites the
    /// previous timestamp rather than rejecting.
    ///
    /// # Errors
    ///
    /// `NotFound` if the specimen does not exist, `TenantMismatch` if
    /// another facility owns it.
    pub fn collect(
        &self,
        facility: FacilityId,
        specimen: SpecimenId,
        collected_at: Option<DateTime<Utc>>,
        barcode: Option<String>,
    ) -> TrackerResult<SpecimenRecord> {
        let mut record = self.owned_specimen(facility, specimen)?;

        if let Some(previous) = record.collected_at {
            tracing::warn!(
                %specimen,
                %previous,
                "collected timestamp overwritten"
            );
        }
        record.collected_at = Some(collected_at.unwrap_or_else(Utc::now));
        if let Some(barcode) = barcode {
            record.subject.barcode = Some(barcode);
        }

        self.store.update_specimen(&record)?;
        tracing::info!(%facility, %specimen, "specimen collected");
        Ok(record)
    }

    /// Remove a specimen that has not progressed past creation.
    ///
    /// # Errors
    ///
    /// `InvalidState` once a collected timestamp is present or testing is
    /// complete; `NotFound`/`TenantMismatch` as for [`Self::collect`].
    pub fn delete_request(&self, facility: FacilityId, specimen: SpecimenId) -> TrackerResult<()> {
        let record = self.owned_specimen(facility, specimen)?;

        if record.collected_at.is_some() {
            return Err(TrackerError::InvalidState(
                "specimen has already been collected".into(),
            ));
        }
        if record.tested_at.is_some() {
            return Err(TrackerError::InvalidState(
                "specimen has already been tested".into(),
            ));
        }

        self.store.delete_specimen(specimen)?;
        tracing::info!(%facility, %specimen, "specimen deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FacilityRef, SenderDetails, SpecimenDraft, SpecimenKind, SubjectDetails,
    };
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use lst_types::NonEmptyText;

    struct Fixture {
        store: Arc<MemoryStore>,
        workflow: CollectionWorkflow,
        facility: FacilityId,
        specimen: SpecimenId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let fac = FacilityRef {
            id: FacilityId::random(),
            name: NonEmptyText::new("Madziabango Health Centre").expect("name"),
            district: None,
        };
        let batch = store
            .find_or_create_open_batch(&fac, &SenderDetails::default())
            .expect("batch");
        let specimen = store
            .insert_specimen(
                batch.id,
                SpecimenDraft {
                    subject: SubjectDetails {
                        name: NonEmptyText::new("Baby Kamanga").expect("name"),
                        barcode: Some("DBS-3000".into()),
                        maternal_id: Some("MAT-42".into()),
                        patient_id: None,
                    },
                    kind: SpecimenKind::DbsCard,
                    pcr_round: None,
                    created_at: None,
                },
            )
            .expect("insert");

        Fixture {
            workflow: CollectionWorkflow::new(store.clone() as Arc<dyn SpecimenStore>),
            store,
            facility: fac.id,
            specimen: specimen.id,
        }
    }

    #[test]
    fn collect_defaults_to_now_and_keeps_barcode() {
        let fx = fixture();
        let before = Utc::now();

        let record = fx
            .workflow
            .collect(fx.facility, fx.specimen, None, None)
            .expect("collect");

        let collected = record.collected_at.expect("collected timestamp");
        assert!(collected >= before);
        assert_eq!(record.subject.barcode.as_deref(), Some("DBS-3000"));
    }

    #[test]
    fn collect_accepts_explicit_timestamp_and_barcode_correction() {
        let fx = fixture();
        let when = Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).single().expect("ts");

        let record = fx
            .workflow
            .collect(fx.facility, fx.specimen, Some(when), Some("DBS-3001".into()))
            .expect("collect");

        assert_eq!(record.collected_at, Some(when));
        assert_eq!(record.subject.barcode.as_deref(), Some("DBS-3001"));
    }

    #[test]
    fn repeat_collection_overwrites_the_timestamp() {
        let fx = fixture();
        let first = Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).single().expect("ts");
        let second = Utc.with_ymd_and_hms(2026, 2, 15, 7, 0, 0).single().expect("ts");

        fx.workflow
            .collect(fx.facility, fx.specimen, Some(first), None)
            .expect("first collect");
        let record = fx
            .workflow
            .collect(fx.facility, fx.specimen, Some(second), None)
            .expect("second collect");

        assert_eq!(record.collected_at, Some(second));
    }

    #[test]
    fn collect_rejects_the_wrong_facility() {
        let fx = fixture();
        let err = fx
            .workflow
            .collect(FacilityId::random(), fx.specimen, None, None)
            .expect_err("wrong tenant");
        assert!(matches!(err, TrackerError::TenantMismatch));

        let err = fx
            .workflow
            .collect(fx.facility, SpecimenId::random(), None, None)
            .expect_err("unknown specimen");
        assert!(matches!(err, TrackerError::NotFound));
    }

    #[test]
    fn delete_succeeds_only_before_collection() {
        let fx = fixture();

        fx.workflow
            .delete_request(fx.facility, fx.specimen)
            .expect("delete pending specimen");
        assert!(fx
            .store
            .specimen(fx.specimen)
            .expect("lookup")
            .is_none());
    }

    #[test]
    fn delete_is_rejected_after_collection() {
        let fx = fixture();
        fx.workflow
            .collect(fx.facility, fx.specimen, None, None)
            .expect("collect");

        let err = fx
            .workflow
            .delete_request(fx.facility, fx.specimen)
            .expect_err("forward-only rule");
        assert!(matches!(err, TrackerError::InvalidState(_)));

        // The specimen is still there.
        assert!(fx
            .store
            .specimen(fx.specimen)
            .expect("lookup")
            .is_some());
    }

    #[test]
    fn delete_is_rejected_after_testing_completes() {
        let fx = fixture();
        let mut record = fx
            .store
            .specimen(fx.specimen)
            .expect("lookup")
            .expect("exists");
        record.tested_at = Some(Utc::now());
        fx.store.update_specimen(&record).expect("update");

        let err = fx
            .workflow
            .delete_request(fx.facility, fx.specimen)
            .expect_err("forward-only rule");
        assert!(matches!(err, TrackerError::InvalidState(_)));
    }
}
