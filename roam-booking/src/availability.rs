use std::sync::Arc;

use roam_catalog::StayRange;
use roam_shared::StoreResult;
use uuid::Uuid;

use crate::models::Reservation;
use crate::repository::ReservationRepository;

/// Double-booking guard for host stays.
///
/// Only reservations with a `paid` payment status block a range. The check is
/// advisory: nothing holds the range between this query and the insert that
/// follows it.
#[derive(Clone)]
pub struct AvailabilityChecker {
    reservations: Arc<dyn ReservationRepository>,
}

impl AvailabilityChecker {
    pub fn new(reservations: Arc<dyn ReservationRepository>) -> Self {
        Self { reservations }
    }

    pub async fn find_conflict(&self, listing_id: Uuid, stay: &StayRange) -> StoreResult<Option<Reservation>> {
        self.reservations.find_paid_overlap(listing_id, stay).await
    }

    pub async fn has_conflict(&self, listing_id: Uuid, stay: &StayRange) -> StoreResult<bool> {
        Ok(self.find_conflict(listing_id, stay).await?.is_some())
    }
}
