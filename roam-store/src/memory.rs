use std::collections::HashMap;

use async_trait::async_trait;
use roam_booking::{PaymentStatus, Reservation, ReservationFilter, ReservationKind, ReservationRepository};
use roam_catalog::{Listing, ListingFilter, ListingRepository, Package, PackageFilter, PackageRepository, StayRange};
use roam_shared::{StoreError, StoreResult};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::documents::{newest_first, Versioned};

/// Process-local document store. Used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    packages: RwLock<HashMap<Uuid, Package>>,
    listings: RwLock<HashMap<Uuid, Listing>>,
    reservations: RwLock<HashMap<(ReservationKind, Uuid), Reservation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compare-and-swap on the version; the stored copy gets `expected + 1`.
fn swap_versioned<K, T>(map: &mut HashMap<K, T>, key: K, doc: &T, expected: u64) -> StoreResult<T>
where
    K: std::hash::Hash + Eq,
    T: Versioned,
{
    let current = map.get(&key).ok_or(StoreError::NotFound {
        collection: doc.collection(),
        id: doc.id(),
    })?;
    if current.version() != expected {
        return Err(StoreError::VersionConflict {
            collection: doc.collection(),
            id: doc.id(),
            expected,
        });
    }

    let mut stored = doc.clone();
    stored.set_version(expected + 1);
    map.insert(key, stored.clone());
    Ok(stored)
}

fn reject_duplicate<K: std::hash::Hash + Eq, T: Versioned>(map: &HashMap<K, T>, key: &K, doc: &T) -> StoreResult<()> {
    if map.contains_key(key) {
        return Err(StoreError::Backend(format!("{} {} already exists", doc.collection(), doc.id())));
    }
    Ok(())
}

#[async_trait]
impl PackageRepository for MemoryStore {
    async fn insert_package(&self, package: &Package) -> StoreResult<()> {
        let mut map = self.packages.write().await;
        reject_duplicate(&map, &package.id, package)?;
        map.insert(package.id, package.clone());
        Ok(())
    }

    async fn get_package(&self, id: Uuid) -> StoreResult<Option<Package>> {
        Ok(self.packages.read().await.get(&id).cloned())
    }

    async fn find_package_by_slug(&self, slug: &str) -> StoreResult<Option<Package>> {
        Ok(self.packages.read().await.values().find(|p| p.slug == slug).cloned())
    }

    async fn list_packages(&self, filter: &PackageFilter) -> StoreResult<Vec<Package>> {
        let mut out: Vec<Package> = self
            .packages
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        newest_first(&mut out);
        Ok(out)
    }

    async fn update_package(&self, package: &Package, expected_version: u64) -> StoreResult<Package> {
        let mut map = self.packages.write().await;
        swap_versioned(&mut map, package.id, package, expected_version)
    }

    async fn delete_package(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.packages.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn insert_listing(&self, listing: &Listing) -> StoreResult<()> {
        let mut map = self.listings.write().await;
        reject_duplicate(&map, &listing.id, listing)?;
        map.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn get_listing(&self, id: Uuid) -> StoreResult<Option<Listing>> {
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn list_listings(&self, filter: &ListingFilter) -> StoreResult<Vec<Listing>> {
        let mut out: Vec<Listing> = self
            .listings
            .read()
            .await
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        newest_first(&mut out);
        Ok(out)
    }

    async fn update_listing(&self, listing: &Listing, expected_version: u64) -> StoreResult<Listing> {
        let mut map = self.listings.write().await;
        swap_versioned(&mut map, listing.id, listing, expected_version)
    }

    async fn delete_listing(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.listings.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn insert(&self, reservation: &Reservation) -> StoreResult<()> {
        let key = (reservation.kind, reservation.id);
        let mut map = self.reservations.write().await;
        reject_duplicate(&map, &key, reservation)?;
        map.insert(key, reservation.clone());
        Ok(())
    }

    async fn get(&self, kind: ReservationKind, id: Uuid) -> StoreResult<Option<Reservation>> {
        Ok(self.reservations.read().await.get(&(kind, id)).cloned())
    }

    async fn list(&self, kind: ReservationKind, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        let mut out: Vec<Reservation> = self
            .reservations
            .read()
            .await
            .values()
            .filter(|r| r.kind == kind && filter.matches(r))
            .cloned()
            .collect();
        newest_first(&mut out);
        Ok(out)
    }

    async fn update(&self, reservation: &Reservation, expected_version: u64) -> StoreResult<Reservation> {
        let mut map = self.reservations.write().await;
        swap_versioned(&mut map, (reservation.kind, reservation.id), reservation, expected_version)
    }

    async fn find_paid_overlap(&self, listing_id: Uuid, stay: &StayRange) -> StoreResult<Option<Reservation>> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .find(|r| {
                r.kind == ReservationKind::HostStay
                    && r.subject_id == listing_id
                    && r.payment_status == PaymentStatus::Paid
                    && r.stay().overlaps(stay)
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use roam_booking::{CustomerSnapshot, GatewayReceipt, PaymentMethod};
    use roam_shared::Masked;

    fn stay_booking(listing_id: Uuid, from_days: i64, nights: i64) -> Reservation {
        let check_in = Utc::now() + Duration::days(from_days);
        Reservation::new(
            ReservationKind::HostStay,
            Uuid::new_v4(),
            listing_id,
            Some(Uuid::new_v4()),
            CustomerSnapshot {
                name: "Guest".into(),
                email: Masked::new("guest@example.com".into()),
                phone: None,
            },
            StayRange::new(check_in, check_in + Duration::days(nights)),
            2,
            5000.0,
            PaymentMethod::Online,
            None,
        )
    }

    #[tokio::test]
    async fn test_update_requires_matching_version() {
        let store = MemoryStore::new();
        let r = stay_booking(Uuid::new_v4(), 5, 2);
        store.insert(&r).await.unwrap();

        let stored = store.update(&r, 0).await.unwrap();
        assert_eq!(stored.version, 1);

        // A second writer still holding version 0 loses.
        let err = store.update(&r, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { expected: 0, .. }));

        let missing = stay_booking(Uuid::new_v4(), 5, 2);
        assert!(matches!(store.update(&missing, 0).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_only_paid_bookings_overlap() {
        let store = MemoryStore::new();
        let listing = Uuid::new_v4();

        let pending = stay_booking(listing, 10, 3);
        store.insert(&pending).await.unwrap();

        let requested = pending.stay();
        assert!(store.find_paid_overlap(listing, &requested).await.unwrap().is_none());

        let mut paid = stay_booking(listing, 10, 3);
        paid.mark_paid(
            GatewayReceipt { order_id: "o".into(), payment_id: "p".into(), signature: "s".into() },
            Utc::now(),
        );
        store.insert(&paid).await.unwrap();

        assert_eq!(store.find_paid_overlap(listing, &requested).await.unwrap().map(|r| r.id), Some(paid.id));
        assert!(store.find_paid_overlap(Uuid::new_v4(), &requested).await.unwrap().is_none());

        let later = StayRange::new(requested.check_out + Duration::days(1), requested.check_out + Duration::days(3));
        assert!(store.find_paid_overlap(listing, &later).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = MemoryStore::new();
        let listing = Uuid::new_v4();
        let mut first = stay_booking(listing, 3, 1);
        first.created_at = Utc::now() - Duration::hours(2);
        let second = stay_booking(listing, 4, 1);
        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();

        let all = store.list(ReservationKind::HostStay, &ReservationFilter::default()).await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        let mine = store
            .list(ReservationKind::HostStay, &ReservationFilter::for_user(first.user_id))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        assert!(store.list(ReservationKind::Package, &ReservationFilter::default()).await.unwrap().is_empty());
    }
}
