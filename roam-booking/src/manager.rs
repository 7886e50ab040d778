use std::cmp::Reverse;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use roam_catalog::{ListingRepository, PackageRepository, StayRange};
use roam_core::RenderedInvoice;
use roam_shared::models::events::{
    BookingCancelledEvent, BookingConfirmedEvent, BookingFacts, BookingReceivedEvent, LifecycleEvent,
};
use roam_shared::Masked;
use serde::Deserialize;
use uuid::Uuid;

use crate::availability::AvailabilityChecker;
use crate::error::{LifecycleError, LifecycleResult};
use crate::models::{
    BookingStatus, CancelledBy, CustomerSnapshot, PaymentMethod, PaymentStatus, Reservation, ReservationKind,
    TransitionError,
};
use crate::notifications::{SideEffectHandle, SideEffects};
use crate::repository::{ReservationFilter, ReservationRepository};
use crate::views::BookingSummary;

/// Input for a package booking. The amount is never taken from the client.
#[derive(Debug, Clone)]
pub struct NewPackageBooking {
    pub user_id: Uuid,
    pub package_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub people: Option<u32>,
    pub payment_method: PaymentMethod,
    pub id_proof_url: Option<String>,
}

/// Input for a host-stay booking, as posted by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHostBooking {
    pub listing_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub host_id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub guests: Option<u32>,
    /// Quoted total; falls back to nightly price x nights.
    pub amount: Option<f64>,
    #[serde(default = "online")]
    pub payment_mode: PaymentMethod,
    pub id_proof_url: Option<String>,
}

/// Admin decision on a pending booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDecision {
    Accepted,
    Rejected,
}

impl FromStr for StatusDecision {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(StatusDecision::Accepted),
            "rejected" => Ok(StatusDecision::Rejected),
            other => Err(LifecycleError::Validation(format!(
                "status must be 'accepted' or 'rejected', got '{}'",
                other
            ))),
        }
    }
}

/// Committed record plus the detached side-effect task, if one was started.
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub reservation: Reservation,
    pub side_effect: Option<SideEffectHandle>,
}

impl TransitionOutcome {
    fn quiet(reservation: Reservation) -> Self {
        Self { reservation, side_effect: None }
    }
}

/// Owns the booking state machine for both reservation kinds.
#[derive(Clone)]
pub struct LifecycleManager {
    reservations: Arc<dyn ReservationRepository>,
    packages: Arc<dyn PackageRepository>,
    listings: Arc<dyn ListingRepository>,
    availability: AvailabilityChecker,
    side_effects: SideEffects,
}

impl LifecycleManager {
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        packages: Arc<dyn PackageRepository>,
        listings: Arc<dyn ListingRepository>,
        side_effects: SideEffects,
    ) -> Self {
        Self {
            availability: AvailabilityChecker::new(reservations.clone()),
            reservations,
            packages,
            listings,
            side_effects,
        }
    }

    /// Creates a pending, unpaid package booking priced at
    /// `package.price x people` and sends the "received" mail.
    pub async fn create_package_booking(&self, req: NewPackageBooking) -> LifecycleResult<TransitionOutcome> {
        let customer = customer_snapshot(req.name, req.email, req.phone)?;
        let stay = well_formed_stay(req.check_in, req.check_out)?;

        let package = self
            .packages
            .get_package(req.package_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("Package {}", req.package_id)))?;

        let people = req.people.unwrap_or(1).max(1);
        let amount = package.price * f64::from(people);

        let reservation = Reservation::new(
            ReservationKind::Package,
            req.user_id,
            package.id,
            package.host_id,
            customer,
            stay,
            people,
            amount,
            req.payment_method,
            req.id_proof_url,
        );
        self.reservations.insert(&reservation).await?;

        tracing::info!(
            booking_id = %reservation.id,
            package_id = %package.id,
            email = %reservation.customer.email,
            amount,
            "Package booking created"
        );

        let facts = booking_facts(&reservation, &package.title);
        let handle = self.side_effects.dispatch(LifecycleEvent::BookingReceived(BookingReceivedEvent {
            facts,
            timestamp: Utc::now().timestamp_millis(),
        }));

        Ok(TransitionOutcome {
            reservation,
            side_effect: Some(handle),
        })
    }

    /// Creates a pending host-stay booking after the listing and availability
    /// checks pass. Nothing is written when any check fails.
    pub async fn create_host_booking(&self, req: NewHostBooking) -> LifecycleResult<Reservation> {
        let (listing_id, user_id, host_id) = match (req.listing_id, req.user_id, req.host_id) {
            (Some(l), Some(u), Some(h)) => (l, u, h),
            _ => return Err(LifecycleError::Validation("listingId, userId and hostId are required".to_string())),
        };
        let customer = guest_snapshot(req.name, req.email, req.phone);
        let stay = well_formed_stay(req.check_in, req.check_out)?;

        let listing = self
            .listings
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("Listing {}", listing_id)))?;

        if listing.host_id != host_id {
            return Err(LifecycleError::Validation("Listing does not belong to this host".to_string()));
        }
        if !listing.approved {
            return Err(LifecycleError::Validation("Listing is not open for booking".to_string()));
        }
        if !listing.is_open_for(&stay) {
            return Err(LifecycleError::Conflict(
                "Listing not available for selected dates".to_string(),
            ));
        }

        if let Some(existing) = self.availability.find_conflict(listing_id, &stay).await? {
            tracing::info!(%listing_id, conflicting = %existing.id, "Host booking rejected, dates taken");
            return Err(LifecycleError::Conflict(
                "Listing not available for selected dates".to_string(),
            ));
        }

        let amount = match req.amount {
            Some(a) if !a.is_finite() || a < 0.0 => {
                return Err(LifecycleError::Validation("amount must be a non-negative number".to_string()))
            }
            Some(a) => a,
            None => listing.price * stay.nights().max(1) as f64,
        };

        let reservation = Reservation::new(
            ReservationKind::HostStay,
            user_id,
            listing_id,
            Some(host_id),
            customer,
            stay,
            req.guests.unwrap_or(1),
            amount,
            req.payment_mode,
            req.id_proof_url,
        );
        self.reservations.insert(&reservation).await?;

        tracing::info!(booking_id = %reservation.id, %listing_id, %host_id, amount, "Host booking created");
        Ok(reservation)
    }

    pub async fn update_status(
        &self,
        kind: ReservationKind,
        id: Uuid,
        decision: StatusDecision,
    ) -> LifecycleResult<TransitionOutcome> {
        match decision {
            StatusDecision::Accepted => self.accept(kind, id).await,
            StatusDecision::Rejected => self.reject(kind, id).await,
        }
    }

    /// Accepts and marks paid, then mails the confirmation with the invoice.
    /// Every successful call re-sends the mail.
    pub async fn accept(&self, kind: ReservationKind, id: Uuid) -> LifecycleResult<TransitionOutcome> {
        let reservation = self.transition(kind, id, |r| r.accept(Utc::now())).await?;
        tracing::info!(booking_id = %id, kind = kind.source(), "Booking accepted");

        let facts = self.facts(&reservation).await;
        let handle = self.side_effects.dispatch(LifecycleEvent::BookingConfirmed(BookingConfirmedEvent {
            facts,
            timestamp: Utc::now().timestamp_millis(),
        }));

        Ok(TransitionOutcome {
            reservation,
            side_effect: Some(handle),
        })
    }

    pub async fn reject(&self, kind: ReservationKind, id: Uuid) -> LifecycleResult<TransitionOutcome> {
        let reservation = self.transition(kind, id, |r| r.reject(Utc::now())).await?;
        tracing::info!(booking_id = %id, kind = kind.source(), "Booking rejected");
        Ok(TransitionOutcome::quiet(reservation))
    }

    pub async fn cancel(&self, kind: ReservationKind, id: Uuid, by: CancelledBy) -> LifecycleResult<TransitionOutcome> {
        self.cancel_at(kind, id, by, Utc::now()).await
    }

    /// Cancels as of `now`; fails once `now` reaches check-in.
    pub async fn cancel_at(
        &self,
        kind: ReservationKind,
        id: Uuid,
        by: CancelledBy,
        now: DateTime<Utc>,
    ) -> LifecycleResult<TransitionOutcome> {
        let reservation = self.transition(kind, id, |r| r.cancel(by, now)).await?;
        let refund_pending = reservation.payment_status == PaymentStatus::RefundPending;
        tracing::info!(booking_id = %id, kind = kind.source(), by = by.as_str(), refund_pending, "Booking cancelled");

        let facts = self.facts(&reservation).await;
        let handle = self.side_effects.dispatch(LifecycleEvent::BookingCancelled(BookingCancelledEvent {
            facts,
            cancelled_by: by.as_str().to_string(),
            refund_pending,
            timestamp: now.timestamp_millis(),
        }));

        Ok(TransitionOutcome {
            reservation,
            side_effect: Some(handle),
        })
    }

    /// Cancels a booking of either kind.
    pub async fn cancel_any(&self, id: Uuid, by: CancelledBy) -> LifecycleResult<TransitionOutcome> {
        let kind = self.locate(id).await?.kind;
        self.cancel(kind, id, by).await
    }

    pub async fn get(&self, kind: ReservationKind, id: Uuid) -> LifecycleResult<Reservation> {
        self.reservations
            .get(kind, id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound("Booking".to_string()))
    }

    pub async fn locate(&self, id: Uuid) -> LifecycleResult<Reservation> {
        self.reservations
            .locate(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound("Booking".to_string()))
    }

    /// A user's bookings of one kind, newest first. Rejected host stays are hidden.
    pub async fn list_for_user(&self, kind: ReservationKind, user_id: Uuid) -> LifecycleResult<Vec<Reservation>> {
        let mut filter = ReservationFilter::for_user(user_id);
        if kind == ReservationKind::HostStay {
            filter = filter.excluding(BookingStatus::Rejected);
        }
        Ok(self.reservations.list(kind, &filter).await?)
    }

    pub async fn list_for_host(&self, host_id: Uuid) -> LifecycleResult<Vec<Reservation>> {
        Ok(self
            .reservations
            .list(ReservationKind::HostStay, &ReservationFilter::for_host(host_id))
            .await?)
    }

    pub async fn list_all(&self, kind: ReservationKind) -> LifecycleResult<Vec<Reservation>> {
        Ok(self.reservations.list(kind, &ReservationFilter::default()).await?)
    }

    /// Both kinds merged into summary rows, latest check-in first.
    pub async fn admin_overview(&self) -> LifecycleResult<Vec<BookingSummary>> {
        let mut rows = Vec::new();
        for kind in [ReservationKind::Package, ReservationKind::HostStay] {
            for reservation in self.list_all(kind).await? {
                let trip = self.title_for(&reservation).await;
                rows.push(BookingSummary::new(&reservation, trip));
            }
        }
        rows.sort_by_key(|row| Reverse(row.date));
        Ok(rows)
    }

    /// Renders the invoice for an accepted booking of either kind.
    pub async fn invoice(&self, id: Uuid) -> LifecycleResult<(Reservation, RenderedInvoice)> {
        let reservation = self
            .reservations
            .locate(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound("Invoice".to_string()))?;

        if reservation.status != BookingStatus::Accepted {
            return Err(LifecycleError::InvoiceUnavailable);
        }

        let facts = self.facts(&reservation).await;
        let rendered = self
            .side_effects
            .invoices()
            .render(&facts)
            .await
            .map_err(|e| LifecycleError::Upstream(e.to_string()))?;
        Ok((reservation, rendered))
    }

    /// Normalized facts for mail and invoices. Title lookups never fail the caller.
    pub async fn facts(&self, reservation: &Reservation) -> BookingFacts {
        let title = self.title_for(reservation).await;
        booking_facts(reservation, &title)
    }

    async fn title_for(&self, reservation: &Reservation) -> String {
        let looked_up = match reservation.kind {
            ReservationKind::Package => self
                .packages
                .get_package(reservation.subject_id)
                .await
                .map(|p| p.map(|p| p.title)),
            ReservationKind::HostStay => self
                .listings
                .get_listing(reservation.subject_id)
                .await
                .map(|l| l.map(|l| l.title)),
        };

        match looked_up {
            Ok(Some(title)) => title,
            Ok(None) => fallback_title(reservation.kind).to_string(),
            Err(e) => {
                tracing::warn!(booking_id = %reservation.id, error = %e, "Title lookup failed");
                fallback_title(reservation.kind).to_string()
            }
        }
    }

    /// Load, apply `change`, write back conditioned on the loaded version.
    async fn transition<F>(&self, kind: ReservationKind, id: Uuid, change: F) -> LifecycleResult<Reservation>
    where
        F: FnOnce(&mut Reservation) -> Result<(), TransitionError>,
    {
        let mut reservation = self.get(kind, id).await?;
        let expected = reservation.version;
        change(&mut reservation)?;
        Ok(self.reservations.update(&reservation, expected).await?)
    }
}

fn fallback_title(kind: ReservationKind) -> &'static str {
    match kind {
        ReservationKind::Package => "Package",
        ReservationKind::HostStay => "Host Stay",
    }
}

fn online() -> PaymentMethod {
    PaymentMethod::Online
}

fn customer_snapshot(name: String, email: String, phone: Option<String>) -> LifecycleResult<CustomerSnapshot> {
    let snapshot = guest_snapshot(name, email, phone);
    if snapshot.name.is_empty() {
        return Err(LifecycleError::Validation("name is required".to_string()));
    }
    if snapshot.email.expose().is_empty() {
        return Err(LifecycleError::Validation("email is required".to_string()));
    }
    Ok(snapshot)
}

/// Host stays carry contact details only when the guest supplies them.
fn guest_snapshot(name: String, email: String, phone: Option<String>) -> CustomerSnapshot {
    CustomerSnapshot {
        name: name.trim().to_string(),
        email: Masked::new(email.trim().to_string()),
        phone: phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(Masked::new),
    }
}

fn well_formed_stay(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> LifecycleResult<StayRange> {
    let stay = StayRange::new(check_in, check_out);
    if !stay.is_well_formed() {
        return Err(LifecycleError::Validation("checkOut must be after checkIn".to_string()));
    }
    Ok(stay)
}

pub(crate) fn booking_facts(reservation: &Reservation, title: &str) -> BookingFacts {
    BookingFacts {
        booking_id: reservation.id,
        source: reservation.kind.source().to_string(),
        title: title.to_string(),
        customer_name: reservation.customer.name.clone(),
        customer_email: reservation.customer.email.clone(),
        customer_phone: reservation.customer.phone.clone(),
        check_in: reservation.check_in,
        check_out: reservation.check_out,
        party_size: reservation.party_size,
        amount: reservation.amount,
        payment_method: reservation.payment_method.label(reservation.kind).to_string(),
        payment_status: reservation.payment_status.to_string(),
        booking_status: reservation.status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_decision_parsing() {
        assert_eq!("accepted".parse::<StatusDecision>().unwrap(), StatusDecision::Accepted);
        assert_eq!("rejected".parse::<StatusDecision>().unwrap(), StatusDecision::Rejected);
        assert!(matches!("cancelled".parse::<StatusDecision>(), Err(LifecycleError::Validation(_))));
        assert!(matches!("".parse::<StatusDecision>(), Err(LifecycleError::Validation(_))));
    }

    #[test]
    fn test_customer_snapshot_requires_name_and_email() {
        assert!(customer_snapshot("  ".into(), "a@b.c".into(), None).is_err());
        assert!(customer_snapshot("Asha".into(), "".into(), None).is_err());

        let snap = customer_snapshot(" Asha ".into(), "a@b.c".into(), Some("  ".into())).unwrap();
        assert_eq!(snap.name, "Asha");
        assert!(snap.phone.is_none());
    }

    #[test]
    fn test_guest_snapshot_allows_missing_contact() {
        let snap = guest_snapshot("".into(), "  ".into(), None);
        assert_eq!(snap.name, "");
        assert_eq!(snap.email.expose(), "");
    }

    #[test]
    fn test_host_booking_defaults_to_online_payment() {
        let req: NewHostBooking = serde_json::from_value(serde_json::json!({
            "listingId": uuid::Uuid::new_v4(),
            "userId": uuid::Uuid::new_v4(),
            "hostId": uuid::Uuid::new_v4(),
            "checkIn": "2026-12-24T00:00:00Z",
            "checkOut": "2026-12-26T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(req.payment_mode, PaymentMethod::Online);
        assert!(req.name.is_empty());

        let req: NewHostBooking = serde_json::from_value(serde_json::json!({
            "checkIn": "2026-12-24T00:00:00Z",
            "checkOut": "2026-12-26T00:00:00Z",
            "paymentMode": "pay_at_property",
        }))
        .unwrap();
        assert_eq!(req.payment_mode, PaymentMethod::AtProperty);
    }

    #[test]
    fn test_inverted_stay_is_rejected() {
        let now = Utc::now();
        assert!(well_formed_stay(now, now).is_err());
        assert!(well_formed_stay(now, now - chrono::Duration::days(1)).is_err());
        assert!(well_formed_stay(now, now + chrono::Duration::days(1)).is_ok());
    }
}
