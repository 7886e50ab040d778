use roam_core::CoreError;
use roam_shared::StoreError;

use crate::models::TransitionError;

/// Failures of lifecycle and payment operations. Everything here is detected
/// before any mutation is committed.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Availability overlap or a lost optimistic-concurrency race.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Invalid payment signature")]
    InvalidSignature,

    #[error("Invoice available only for accepted bookings")]
    InvoiceUnavailable,

    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Store(StoreError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { .. } => {
                LifecycleError::Conflict("Booking was modified concurrently, retry the request".to_string())
            }
            StoreError::NotFound { collection, id } => LifecycleError::NotFound(format!("{} {}", collection, id)),
            other => LifecycleError::Store(other),
        }
    }
}

impl From<TransitionError> for LifecycleError {
    fn from(err: TransitionError) -> Self {
        LifecycleError::InvalidTransition(err.to_string())
    }
}

impl From<CoreError> for LifecycleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => LifecycleError::Validation(msg),
            CoreError::InternalError(msg) => LifecycleError::Upstream(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use uuid::Uuid;

    #[test]
    fn test_store_error_mapping() {
        let id = Uuid::new_v4();
        let err: LifecycleError = StoreError::VersionConflict { collection: "bookings", id, expected: 3 }.into();
        assert!(matches!(err, LifecycleError::Conflict(_)));

        let err: LifecycleError = StoreError::Backend("pool closed".into()).into();
        assert!(matches!(err, LifecycleError::Store(_)));
    }

    #[test]
    fn test_transition_error_message() {
        let err: LifecycleError =
            TransitionError::NotAllowed { action: "cancel", from: BookingStatus::Cancelled }.into();
        assert_eq!(err.to_string(), "Cannot cancel a booking that is cancelled");
    }
}
