use uuid::Uuid;

/// Errors raised by any document store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection} {id} not found")]
    NotFound { collection: &'static str, id: Uuid },

    /// The stored version moved on between the read and the conditional write.
    #[error("{collection} {id} was modified concurrently (expected version {expected})")]
    VersionConflict {
        collection: &'static str,
        id: Uuid,
        expected: u64,
    },

    #[error("Corrupt document in {collection}: {reason}")]
    Corrupt {
        collection: &'static str,
        reason: String,
    },

    #[error("Store backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt {
            collection: "document",
            reason: err.to_string(),
        }
    }
}
