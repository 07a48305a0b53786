//! In-process store implementation.
//!
//! Backs the test suite and the default runtime. A single coarse mutex per
//! store serialises the hazardous operations (batch find-or-create,
//! position assignment, package stamping), satisfying the atomicity the
//! [`SpecimenStore`] contract requires of every implementation.

use super::SpecimenStore;
use crate::model::{
    BatchId, BatchRecord, FacilityId, FacilityRef, SenderDetails, SpecimenDraft, SpecimenId,
    SpecimenRecord,
};
use crate::{TrackerError, TrackerResult};
use chrono::Utc;
use lst_types::{BatchPosition, NonEmptyText, PositionError, BATCH_CAPACITY};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct State {
    batches: HashMap<BatchId, BatchRecord>,
    specimens: HashMap<SpecimenId, SpecimenRecord>,
}

impl State {
    /// Highest occupied position in `batch`, or `None` for an empty batch.
    ///
    /// Positions are allocated past the highest slot ever occupied rather
    /// than by row count, so uniqueness survives deletion of a pending
    /// specimen.
    fn highest_position(&self, batch: BatchId) -> Option<BatchPosition> {
        self.specimens
            .values()
            .filter(|s| s.batch_id == batch)
            .map(|s| s.position)
            .max()
    }

    fn position_after(&self, batch: BatchId) -> TrackerResult<BatchPosition> {
        match self.highest_position(batch) {
            None => Ok(BatchPosition::FIRST),
            Some(last) => last.next().map_err(|err| match err {
                PositionError::ExceedsCapacity(_) => TrackerError::BatchFull {
                    capacity: BATCH_CAPACITY,
                },
                PositionError::Zero => TrackerError::Storage(err.to_string()),
            }),
        }
    }
}

/// A [`SpecimenStore`] holding all state in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock means a panicking test thread, not corrupt data;
        // every mutation below leaves the maps consistent at each step.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SpecimenStore for MemoryStore {
    fn find_or_create_open_batch(
        &self,
        facility: &FacilityRef,
        sender: &SenderDetails,
    ) -> TrackerResult<BatchRecord> {
        let mut state = self.lock();

        if let Some(open) = state
            .batches
            .values()
            .find(|b| b.facility.id == facility.id && b.is_open())
        {
            return Ok(open.clone());
        }

        let batch = BatchRecord {
            id: BatchId::random(),
            facility: facility.clone(),
            sender: sender.clone(),
            created_at: Utc::now(),
            dispatched_at: None,
        };
        state.batches.insert(batch.id, batch.clone());
        Ok(batch)
    }

    fn batch(&self, id: BatchId) -> TrackerResult<Option<BatchRecord>> {
        Ok(self.lock().batches.get(&id).cloned())
    }

    fn next_position(&self, batch: BatchId) -> TrackerResult<BatchPosition> {
        let state = self.lock();
        if !state.batches.contains_key(&batch) {
            return Err(TrackerError::NotFound);
        }
        state.position_after(batch)
    }

    fn insert_specimen(
        &self,
        batch: BatchId,
        draft: SpecimenDraft,
    ) -> TrackerResult<SpecimenRecord> {
        let mut state = self.lock();

        let batch_record = state.batches.get(&batch).ok_or(TrackerError::NotFound)?;
        if !batch_record.is_open() {
            return Err(TrackerError::InvalidState(
                "batch has been dispatched".into(),
            ));
        }
        let facility_id = batch_record.facility.id;

        let position = state.position_after(batch)?;
        let specimen = SpecimenRecord {
            id: SpecimenId::random(),
            batch_id: batch,
            facility_id,
            position,
            subject: draft.subject,
            kind: draft.kind,
            pcr_round: draft.pcr_round,
            created_at: draft.created_at.unwrap_or_else(Utc::now),
            collected_at: None,
            received_at: None,
            tested_at: None,
            verified_at: None,
            result: None,
            package_label: None,
        };
        state.specimens.insert(specimen.id, specimen.clone());
        Ok(specimen)
    }

    fn specimen(&self, id: SpecimenId) -> TrackerResult<Option<SpecimenRecord>> {
        Ok(self.lock().specimens.get(&id).cloned())
    }

    fn update_specimen(&self, record: &SpecimenRecord) -> TrackerResult<()> {
        let mut state = self.lock();
        match state.specimens.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(TrackerError::NotFound),
        }
    }

    fn delete_specimen(&self, id: SpecimenId) -> TrackerResult<()> {
        match self.lock().specimens.remove(&id) {
            Some(_) => Ok(()),
            None => Err(TrackerError::NotFound),
        }
    }

    fn specimens_for_facility(&self, facility: FacilityId) -> TrackerResult<Vec<SpecimenRecord>> {
        Ok(self
            .lock()
            .specimens
            .values()
            .filter(|s| s.facility_id == facility)
            .cloned()
            .collect())
    }

    fn assign_package(
        &self,
        facility: FacilityId,
        ids: &[SpecimenId],
        label: &NonEmptyText,
    ) -> TrackerResult<Vec<SpecimenRecord>> {
        let mut state = self.lock();

        // Validate the whole set before touching anything.
        for id in ids {
            let specimen = state.specimens.get(id).ok_or(TrackerError::NotFound)?;
            if specimen.facility_id != facility {
                return Err(TrackerError::NotFound);
            }
            if !specimen.is_collected() {
                return Err(TrackerError::InvalidInput(format!(
                    "specimen {id} has not been collected"
                )));
            }
            if let Some(existing) = &specimen.package_label {
                return Err(TrackerError::AlreadyPackaged {
                    specimen: *id,
                    package: existing.as_str().to_owned(),
                });
            }
        }

        let mut stamped = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(specimen) = state.specimens.get_mut(id) {
                specimen.package_label = Some(label.clone());
                stamped.push(specimen.clone());
            }
        }
        Ok(stamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SpecimenKind, SubjectDetails};
    use std::sync::Arc;

    fn facility() -> FacilityRef {
        FacilityRef {
            id: FacilityId::random(),
            name: NonEmptyText::new("Ndirande Health Centre").expect("name"),
            district: Some("Blantyre".into()),
        }
    }

    fn draft(name: &str) -> SpecimenDraft {
        SpecimenDraft {
            subject: SubjectDetails {
                name: NonEmptyText::new(name).expect("name"),
                barcode: None,
                maternal_id: None,
                patient_id: None,
            },
            kind: SpecimenKind::DbsCard,
            pcr_round: None,
            created_at: None,
        }
    }

    #[test]
    fn find_or_create_reuses_the_open_batch() {
        let store = MemoryStore::new();
        let fac = facility();
        let sender = SenderDetails::default();

        let first = store
            .find_or_create_open_batch(&fac, &sender)
            .expect("create batch");
        let second = store
            .find_or_create_open_batch(&fac, &sender)
            .expect("reuse batch");
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn concurrent_first_use_creates_exactly_one_open_batch() {
        let store = Arc::new(MemoryStore::new());
        let fac = facility();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let fac = fac.clone();
                std::thread::spawn(move || {
                    store
                        .find_or_create_open_batch(&fac, &SenderDetails::default())
                        .expect("open batch")
                        .id
                })
            })
            .collect();

        let mut ids: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect();
        ids.sort_by_key(|id| id.as_uuid());
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn concurrent_inserts_never_share_a_position() {
        let store = Arc::new(MemoryStore::new());
        let fac = facility();
        let batch = store
            .find_or_create_open_batch(&fac, &SenderDetails::default())
            .expect("open batch");

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                let batch_id = batch.id;
                std::thread::spawn(move || {
                    store
                        .insert_specimen(batch_id, draft(&format!("Subject {i}")))
                        .expect("insert")
                        .position
                })
            })
            .collect();

        let mut positions: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread").get())
            .collect();
        positions.sort_unstable();
        let expected: Vec<u16> = (1..=16).collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn positions_stay_unique_after_deleting_a_pending_specimen() {
        let store = MemoryStore::new();
        let fac = facility();
        let batch = store
            .find_or_create_open_batch(&fac, &SenderDetails::default())
            .expect("open batch");

        let s1 = store.insert_specimen(batch.id, draft("One")).expect("s1");
        let s2 = store.insert_specimen(batch.id, draft("Two")).expect("s2");
        let s3 = store.insert_specimen(batch.id, draft("Three")).expect("s3");
        assert_eq!(
            (s1.position.get(), s2.position.get(), s3.position.get()),
            (1, 2, 3)
        );

        store.delete_specimen(s2.id).expect("delete");
        let s4 = store.insert_specimen(batch.id, draft("Four")).expect("s4");
        assert_eq!(s4.position.get(), 4);
    }

    #[test]
    fn insert_fails_once_batch_is_full_and_leaves_it_unchanged() {
        let store = MemoryStore::new();
        let fac = facility();
        let batch = store
            .find_or_create_open_batch(&fac, &SenderDetails::default())
            .expect("open batch");

        for i in 0..BATCH_CAPACITY {
            store
                .insert_specimen(batch.id, draft(&format!("Subject {i}")))
                .expect("insert within capacity");
        }

        let err = store
            .insert_specimen(batch.id, draft("Overflow"))
            .expect_err("capacity bound");
        assert!(matches!(err, TrackerError::BatchFull { capacity } if capacity == BATCH_CAPACITY));

        let count = store
            .specimens_for_facility(fac.id)
            .expect("list")
            .len();
        assert_eq!(count, usize::from(BATCH_CAPACITY));
    }

    #[test]
    fn insert_into_dispatched_batch_is_rejected() {
        let store = MemoryStore::new();
        let fac = facility();
        let mut batch = store
            .find_or_create_open_batch(&fac, &SenderDetails::default())
            .expect("open batch");

        batch.dispatched_at = Some(Utc::now());
        store
            .lock()
            .batches
            .insert(batch.id, batch.clone());

        let err = store
            .insert_specimen(batch.id, draft("Late arrival"))
            .expect_err("closed batch");
        assert!(matches!(err, TrackerError::InvalidState(_)));

        // The facility now gets a fresh open batch.
        let next = store
            .find_or_create_open_batch(&fac, &SenderDetails::default())
            .expect("new open batch");
        assert_ne!(next.id, batch.id);
    }

    #[test]
    fn assign_package_is_all_or_nothing() {
        let store = MemoryStore::new();
        let fac = facility();
        let batch = store
            .find_or_create_open_batch(&fac, &SenderDetails::default())
            .expect("open batch");

        let mut s1 = store.insert_specimen(batch.id, draft("One")).expect("s1");
        let mut s2 = store.insert_specimen(batch.id, draft("Two")).expect("s2");
        s1.collected_at = Some(Utc::now());
        s2.collected_at = Some(Utc::now());
        store.update_specimen(&s1).expect("update s1");
        store.update_specimen(&s2).expect("update s2");

        let prior = NonEmptyText::new("PKG-000").expect("label");
        store
            .assign_package(fac.id, &[s2.id], &prior)
            .expect("prior package");

        let label = NonEmptyText::new("PKG-001").expect("label");
        let err = store
            .assign_package(fac.id, &[s1.id, s2.id], &label)
            .expect_err("s2 already packaged");
        assert!(matches!(err, TrackerError::AlreadyPackaged { specimen, .. } if specimen == s2.id));

        // s1 was not stamped by the failed call.
        let reloaded = store.specimen(s1.id).expect("get").expect("exists");
        assert!(reloaded.package_label.is_none());
    }

    #[test]
    fn concurrent_packaging_claims_a_specimen_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let fac = facility();
        let batch = store
            .find_or_create_open_batch(&fac, &SenderDetails::default())
            .expect("open batch");

        let mut s = store.insert_specimen(batch.id, draft("Contested")).expect("s");
        s.collected_at = Some(Utc::now());
        store.update_specimen(&s).expect("update");

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                let facility_id = fac.id;
                let specimen_id = s.id;
                std::thread::spawn(move || {
                    let label = NonEmptyText::new(format!("PKG-{i:03}")).expect("label");
                    store.assign_package(facility_id, &[specimen_id], &label).is_ok()
                })
            })
            .collect();

        let results: Vec<bool> = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect();
        assert_eq!(results.into_iter().filter(|won| *won).count(), 1);

        let reloaded = store.specimen(s.id).expect("get").expect("exists");
        assert!(reloaded.package_label.is_some());
    }

    #[test]
    fn cross_tenant_lookups_read_as_not_found() {
        let store = MemoryStore::new();
        let fac_a = facility();
        let fac_b = facility();
        let batch = store
            .find_or_create_open_batch(&fac_a, &SenderDetails::default())
            .expect("open batch");

        let mut s = store.insert_specimen(batch.id, draft("One")).expect("s");
        s.collected_at = Some(Utc::now());
        store.update_specimen(&s).expect("update");

        let label = NonEmptyText::new("PKG-001").expect("label");
        let err = store
            .assign_package(fac_b.id, &[s.id], &label)
            .expect_err("wrong tenant");
        assert!(matches!(err, TrackerError::NotFound));
    }
}
