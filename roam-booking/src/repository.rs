use async_trait::async_trait;
use roam_catalog::StayRange;
use roam_shared::StoreResult;
use uuid::Uuid;

use crate::models::{BookingStatus, Reservation, ReservationKind};

/// Simple equality filters over one reservation collection.
#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub user_id: Option<Uuid>,
    pub host_id: Option<Uuid>,
    pub exclude_status: Option<BookingStatus>,
}

impl ReservationFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self { user_id: Some(user_id), ..Default::default() }
    }

    pub fn for_host(host_id: Uuid) -> Self {
        Self { host_id: Some(host_id), ..Default::default() }
    }

    pub fn excluding(mut self, status: BookingStatus) -> Self {
        self.exclude_status = Some(status);
        self
    }

    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.user_id.map_or(true, |u| u == reservation.user_id)
            && self.host_id.map_or(true, |h| Some(h) == reservation.host_id)
            && self.exclude_status.map_or(true, |s| s != reservation.status)
    }
}

/// Document access for both reservation collections.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn insert(&self, reservation: &Reservation) -> StoreResult<()>;

    async fn get(&self, kind: ReservationKind, id: Uuid) -> StoreResult<Option<Reservation>>;

    /// Newest first.
    async fn list(&self, kind: ReservationKind, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>>;

    /// Conditional write: succeeds only while the stored version equals
    /// `expected_version`. Returns the stored record with its bumped version.
    async fn update(&self, reservation: &Reservation, expected_version: u64) -> StoreResult<Reservation>;

    /// A paid host-stay reservation on `listing_id` whose range overlaps `stay`.
    async fn find_paid_overlap(&self, listing_id: Uuid, stay: &StayRange) -> StoreResult<Option<Reservation>>;

    /// Resolves an id without knowing its kind; package bookings win ties.
    async fn locate(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        if let Some(found) = self.get(ReservationKind::Package, id).await? {
            return Ok(Some(found));
        }
        self.get(ReservationKind::HostStay, id).await
    }
}
