//! One store handle per logical program database.
//!
//! The source system cached a single shared connection per logical database
//! in process-wide globals. Here the lifecycle is explicit: a `StorePool`
//! is built once at startup with one [`SpecimenStore`] per [`Program`],
//! shared behind `Arc` for the life of the process, and shut down exactly
//! once on exit via [`StorePool::shutdown`]. Nothing opens or caches store
//! handles during request handling.

use super::{MemoryStore, SpecimenStore};
use crate::model::Program;
use crate::{TrackerError, TrackerResult};
use std::collections::HashMap;
use std::sync::Arc;

/// The set of per-program stores the engine runs against.
pub struct StorePool {
    stores: HashMap<Program, Arc<dyn SpecimenStore>>,
}

impl StorePool {
    /// Build a pool from explicit per-program stores.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidInput` unless every program in
    /// [`Program::ALL`] is covered; a partially wired pool would turn into
    /// request-time failures otherwise.
    pub fn new(stores: HashMap<Program, Arc<dyn SpecimenStore>>) -> TrackerResult<Self> {
        for program in Program::ALL {
            if !stores.contains_key(&program) {
                return Err(TrackerError::InvalidInput(format!(
                    "no store configured for program \"{program}\""
                )));
            }
        }
        Ok(Self { stores })
    }

    /// Build a pool with a fresh in-memory store per program.
    pub fn open_in_memory() -> Self {
        let stores = Program::ALL
            .into_iter()
            .map(|p| (p, Arc::new(MemoryStore::new()) as Arc<dyn SpecimenStore>))
            .collect();
        Self { stores }
    }

    /// The store backing `program`.
    pub fn store(&self, program: Program) -> TrackerResult<Arc<dyn SpecimenStore>> {
        self.stores
            .get(&program)
            .cloned()
            .ok_or_else(|| TrackerError::Storage(format!("store for \"{program}\" is gone")))
    }

    /// Shut down every store. Call once when the process exits; the first
    /// failure is returned after the remaining stores have still been asked
    /// to shut down.
    pub fn shutdown(&self) -> TrackerResult<()> {
        let mut first_failure = None;
        for (program, store) in &self.stores {
            if let Err(err) = store.shutdown() {
                tracing::error!(%program, %err, "store shutdown failed");
                first_failure.get_or_insert(err);
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
