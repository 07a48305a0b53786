use crate::model::SpecimenId;

/// Errors surfaced by the specimen-tracking core.
///
/// The variants are the business failures a caller can act on; storage or
/// connectivity failures are wrapped in [`TrackerError::Storage`] and
/// propagate unrecovered, since retry affordances live in the presentation
/// layer.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("record not found in this facility")]
    NotFound,
    #[error("record belongs to a different facility")]
    TenantMismatch,
    #[error("batch is full (capacity {capacity})")]
    BatchFull { capacity: u16 },
    #[error("specimen {specimen} is already in package \"{package}\"")]
    AlreadyPackaged {
        specimen: SpecimenId,
        package: String,
    },
    #[error("not permitted in the specimen's current state: {0}")]
    InvalidState(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
