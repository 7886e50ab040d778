use async_trait::async_trait;
use roam_shared::StoreResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::listing::Listing;
use crate::package::{Package, PackageFilter};

/// Repository trait for package documents
#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn insert_package(&self, package: &Package) -> StoreResult<()>;

    async fn get_package(&self, id: Uuid) -> StoreResult<Option<Package>>;

    async fn find_package_by_slug(&self, slug: &str) -> StoreResult<Option<Package>>;

    /// Newest first.
    async fn list_packages(&self, filter: &PackageFilter) -> StoreResult<Vec<Package>>;

    /// Writes only if the stored version equals `expected_version`; returns the
    /// stored document with its bumped version.
    async fn update_package(&self, package: &Package, expected_version: u64) -> StoreResult<Package>;

    /// Returns false when nothing was deleted.
    async fn delete_package(&self, id: Uuid) -> StoreResult<bool>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilter {
    pub host_id: Option<Uuid>,
    pub approved: Option<bool>,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        self.host_id.map_or(true, |h| h == listing.host_id)
            && self.approved.map_or(true, |a| a == listing.approved)
    }
}

/// Repository trait for listing documents
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn insert_listing(&self, listing: &Listing) -> StoreResult<()>;

    async fn get_listing(&self, id: Uuid) -> StoreResult<Option<Listing>>;

    /// Newest first.
    async fn list_listings(&self, filter: &ListingFilter) -> StoreResult<Vec<Listing>>;

    async fn update_listing(&self, listing: &Listing, expected_version: u64) -> StoreResult<Listing>;

    async fn delete_listing(&self, id: Uuid) -> StoreResult<bool>;
}
