use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::listing::{Listing, ListingDraft};
use crate::package::{Package, PackageDraft, PackageFilter};
use crate::repository::{ListingFilter, ListingRepository, PackageRepository};
use crate::{CatalogError, CatalogResult};

/// Who is asking for a catalog mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Admin,
    Host(Uuid),
}

impl Actor {
    fn may_manage(&self, listing: &Listing) -> bool {
        match self {
            Actor::Admin => true,
            Actor::Host(id) => *id == listing.host_id,
        }
    }
}

/// Package and listing management on top of the catalog repositories.
#[derive(Clone)]
pub struct CatalogService {
    packages: Arc<dyn PackageRepository>,
    listings: Arc<dyn ListingRepository>,
}

impl CatalogService {
    pub fn new(packages: Arc<dyn PackageRepository>, listings: Arc<dyn ListingRepository>) -> Self {
        Self { packages, listings }
    }

    pub async fn create_package(&self, draft: PackageDraft) -> CatalogResult<Package> {
        let package = Package::new(draft)?;
        self.packages.insert_package(&package).await?;
        info!("Package created: {} ({})", package.id, package.slug);
        Ok(package)
    }

    pub async fn update_package(
        &self,
        id: Uuid,
        draft: PackageDraft,
        remove_images: &[String],
    ) -> CatalogResult<Package> {
        let mut package = self.package(id).await?;
        let expected = package.version;
        package.apply(draft, remove_images)?;
        let stored = self.packages.update_package(&package, expected).await?;
        info!("Package updated: {} ({})", stored.id, stored.slug);
        Ok(stored)
    }

    pub async fn package(&self, id: Uuid) -> CatalogResult<Package> {
        self.packages
            .get_package(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Package {}", id)))
    }

    pub async fn package_by_slug(&self, slug: &str) -> CatalogResult<Package> {
        self.packages
            .find_package_by_slug(slug)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Package '{}'", slug)))
    }

    pub async fn list_packages(&self, filter: &PackageFilter) -> CatalogResult<Vec<Package>> {
        Ok(self.packages.list_packages(filter).await?)
    }

    pub async fn delete_package(&self, id: Uuid) -> CatalogResult<()> {
        if !self.packages.delete_package(id).await? {
            return Err(CatalogError::NotFound(format!("Package {}", id)));
        }
        info!("Package deleted: {}", id);
        Ok(())
    }

    pub async fn create_listing(&self, host_id: Uuid, draft: ListingDraft) -> CatalogResult<Listing> {
        let listing = Listing::new(host_id, draft)?;
        self.listings.insert_listing(&listing).await?;
        info!("Listing {} submitted for approval by host {}", listing.id, host_id);
        Ok(listing)
    }

    pub async fn listing(&self, id: Uuid) -> CatalogResult<Listing> {
        self.listings
            .get_listing(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Listing {}", id)))
    }

    /// Approved listings only.
    pub async fn public_listings(&self) -> CatalogResult<Vec<Listing>> {
        let filter = ListingFilter { approved: Some(true), ..Default::default() };
        Ok(self.listings.list_listings(&filter).await?)
    }

    pub async fn host_listings(&self, host_id: Uuid) -> CatalogResult<Vec<Listing>> {
        let filter = ListingFilter { host_id: Some(host_id), ..Default::default() };
        Ok(self.listings.list_listings(&filter).await?)
    }

    pub async fn all_listings(&self) -> CatalogResult<Vec<Listing>> {
        Ok(self.listings.list_listings(&ListingFilter::default()).await?)
    }

    pub async fn update_listing(&self, actor: Actor, id: Uuid, draft: ListingDraft) -> CatalogResult<Listing> {
        let mut listing = self.listing(id).await?;
        if !actor.may_manage(&listing) {
            return Err(CatalogError::Forbidden(format!("listing {} belongs to another host", id)));
        }
        let expected = listing.version;
        listing.apply(draft)?;
        Ok(self.listings.update_listing(&listing, expected).await?)
    }

    /// Admin gate: approve (true) or reject (false).
    pub async fn set_listing_approval(&self, id: Uuid, approved: bool) -> CatalogResult<Listing> {
        let mut listing = self.listing(id).await?;
        let expected = listing.version;
        listing.set_approved(approved);
        let stored = self.listings.update_listing(&listing, expected).await?;
        info!("Listing {} approved={}", id, approved);
        Ok(stored)
    }

    pub async fn delete_listing(&self, actor: Actor, id: Uuid) -> CatalogResult<()> {
        let listing = self.listing(id).await?;
        if !actor.may_manage(&listing) {
            return Err(CatalogError::Forbidden(format!("listing {} belongs to another host", id)));
        }
        self.listings.delete_listing(id).await?;
        info!("Listing deleted: {}", id);
        Ok(())
    }
}
