use crate::forms::FieldErrors;
use crate::store::StoreError;

/// Terminal outcomes of a read or mutation that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("authentication required")]
    NotAuthenticated,
    #[error("record not found")]
    RecordNotFound,
    #[error("not authorized to modify this record")]
    NotAuthorized,
    #[error("validation failed on {} field(s)", .0.len())]
    ValidationFailed(FieldErrors),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for FlowError {
    fn from(err: StoreError) -> Self {
        match err {
            // The row vanished between resolution and persistence.
            StoreError::NotFound => FlowError::RecordNotFound,
            other => FlowError::Store(other),
        }
    }
}
