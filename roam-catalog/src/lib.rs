pub mod dates;
pub mod listing;
pub mod package;
pub mod repository;
pub mod service;

pub use dates::StayRange;
pub use listing::{BlockedRange, Listing, ListingDraft};
pub use package::{slugify, Package, PackageDraft, PackageFilter};
pub use repository::{ListingFilter, ListingRepository, PackageRepository};
pub use service::{Actor, CatalogService};

/// Catalog-related errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(roam_shared::StoreError),
}

impl From<roam_shared::StoreError> for CatalogError {
    fn from(err: roam_shared::StoreError) -> Self {
        match err {
            roam_shared::StoreError::VersionConflict { .. } => CatalogError::Conflict(err.to_string()),
            roam_shared::StoreError::NotFound { collection, id } => {
                CatalogError::NotFound(format!("{} {}", collection, id))
            }
            other => CatalogError::Store(other),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
