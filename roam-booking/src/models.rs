use chrono::{DateTime, Utc};
use roam_catalog::StayRange;
use roam_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which product a reservation was made against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReservationKind {
    /// Fixed-itinerary package (`Booking`)
    #[serde(alias = "package")]
    Package,
    /// Host-listed stay (`HostBooking`)
    #[serde(alias = "host")]
    HostStay,
}

/// External field names per kind. Storage is shared; only the wire view differs.
#[derive(Debug)]
pub struct KindFields {
    pub status: &'static str,
    pub party_size: &'static str,
    pub payment_method: &'static str,
    pub subject: &'static str,
    pub order_id: &'static str,
    pub payment_id: &'static str,
    pub signature: &'static str,
}

const PACKAGE_FIELDS: KindFields = KindFields {
    status: "status",
    party_size: "people",
    payment_method: "paymentMethod",
    subject: "packageId",
    order_id: "razorpay_order_id",
    payment_id: "razorpay_payment_id",
    signature: "razorpay_signature",
};

const HOST_STAY_FIELDS: KindFields = KindFields {
    status: "bookingStatus",
    party_size: "guests",
    payment_method: "paymentMode",
    subject: "listingId",
    order_id: "razorpayOrderId",
    payment_id: "razorpayPaymentId",
    signature: "razorpaySignature",
};

impl ReservationKind {
    pub fn collection(&self) -> &'static str {
        match self {
            ReservationKind::Package => "bookings",
            ReservationKind::HostStay => "host_bookings",
        }
    }

    /// Short label used in merged admin views and mail.
    pub fn source(&self) -> &'static str {
        match self {
            ReservationKind::Package => "package",
            ReservationKind::HostStay => "host",
        }
    }

    pub fn fields(&self) -> &'static KindFields {
        match self {
            ReservationKind::Package => &PACKAGE_FIELDS,
            ReservationKind::HostStay => &HOST_STAY_FIELDS,
        }
    }

    /// Payment status a freshly created reservation starts with.
    pub fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            ReservationKind::Package => PaymentStatus::Unpaid,
            ReservationKind::HostStay => PaymentStatus::Pending,
        }
    }
}

/// Workflow approval state (`status` / `bookingStatus`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Money state, evolving alongside `BookingStatus`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    RefundPending,
    Refunded,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::RefundPending => "refund_pending",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Settled on arrival ("property" for packages, "pay_at_property" for stays)
    #[default]
    #[serde(alias = "property", alias = "pay_at_property")]
    AtProperty,
    Online,
}

impl PaymentMethod {
    pub fn label(&self, kind: ReservationKind) -> &'static str {
        match (self, kind) {
            (PaymentMethod::Online, _) => "online",
            (PaymentMethod::AtProperty, ReservationKind::Package) => "property",
            (PaymentMethod::AtProperty, ReservationKind::HostStay) => "pay_at_property",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(PaymentMethod::Online),
            "property" | "pay_at_property" | "at_property" => Ok(PaymentMethod::AtProperty),
            other => Err(format!("unknown payment method '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    User,
    Admin,
}

impl CancelledBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelledBy::User => "user",
            CancelledBy::Admin => "admin",
        }
    }
}

/// Customer details copied onto the reservation at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Option<Masked<String>>,
}

/// Identifiers and signature from a verified gateway confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayReceipt {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// A booking of either kind. `amount` is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub kind: ReservationKind,
    /// Bumped on every committed write; guards read-modify-write cycles.
    #[serde(default)]
    pub version: u64,
    pub user_id: Uuid,
    /// Package id or listing id, depending on `kind`.
    pub subject_id: Uuid,
    pub host_id: Option<Uuid>,
    pub customer: CustomerSnapshot,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub party_size: u32,
    pub amount: f64,
    pub id_proof_url: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub gateway: Option<GatewayReceipt>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<CancelledBy>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rejected state-machine moves.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot {action} a booking that is {from}")]
    NotAllowed { action: &'static str, from: BookingStatus },

    #[error("Check-in date already passed")]
    AfterCheckIn,
}

impl Reservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: ReservationKind,
        user_id: Uuid,
        subject_id: Uuid,
        host_id: Option<Uuid>,
        customer: CustomerSnapshot,
        stay: StayRange,
        party_size: u32,
        amount: f64,
        payment_method: PaymentMethod,
        id_proof_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            version: 0,
            user_id,
            subject_id,
            host_id,
            customer,
            check_in: stay.check_in,
            check_out: stay.check_out,
            party_size: party_size.max(1),
            amount,
            id_proof_url,
            payment_method,
            payment_status: kind.initial_payment_status(),
            status: BookingStatus::Pending,
            gateway: None,
            cancelled_at: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn stay(&self) -> StayRange {
        StayRange::new(self.check_in, self.check_out)
    }

    /// pending|accepted -> accepted, payment -> paid.
    /// Re-accepting lands in the same state.
    pub fn accept(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        match self.status {
            BookingStatus::Pending | BookingStatus::Accepted => {
                self.status = BookingStatus::Accepted;
                self.payment_status = PaymentStatus::Paid;
                self.updated_at = now;
                Ok(())
            }
            from => Err(TransitionError::NotAllowed { action: "accept", from }),
        }
    }

    /// pending|rejected -> rejected, payment -> failed.
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        match self.status {
            BookingStatus::Pending | BookingStatus::Rejected => {
                self.status = BookingStatus::Rejected;
                self.payment_status = PaymentStatus::Failed;
                self.updated_at = now;
                Ok(())
            }
            from => Err(TransitionError::NotAllowed { action: "reject", from }),
        }
    }

    /// pending|accepted -> cancelled, strictly before check-in.
    /// Paid bookings move to refund_pending, everything else to cancelled.
    pub fn cancel(&mut self, by: CancelledBy, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if !matches!(self.status, BookingStatus::Pending | BookingStatus::Accepted) {
            return Err(TransitionError::NotAllowed { action: "cancel", from: self.status });
        }
        if now >= self.check_in {
            return Err(TransitionError::AfterCheckIn);
        }

        self.status = BookingStatus::Cancelled;
        self.payment_status = if self.payment_status == PaymentStatus::Paid {
            PaymentStatus::RefundPending
        } else {
            PaymentStatus::Cancelled
        };
        self.cancelled_at = Some(now);
        self.cancelled_by = Some(by);
        self.updated_at = now;
        Ok(())
    }

    /// Records a verified gateway payment. Independent of the approval workflow.
    pub fn mark_paid(&mut self, receipt: GatewayReceipt, now: DateTime<Utc>) {
        self.payment_status = PaymentStatus::Paid;
        self.gateway = Some(receipt);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reservation(kind: ReservationKind) -> Reservation {
        let check_in = Utc::now() + Duration::days(10);
        Reservation::new(
            kind,
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            CustomerSnapshot {
                name: "Asha".to_string(),
                email: Masked::new("asha@example.com".to_string()),
                phone: None,
            },
            StayRange::new(check_in, check_in + Duration::days(3)),
            0,
            3000.0,
            PaymentMethod::Online,
            None,
        )
    }

    #[test]
    fn test_initial_state_per_kind() {
        let pkg = reservation(ReservationKind::Package);
        assert_eq!(pkg.status, BookingStatus::Pending);
        assert_eq!(pkg.payment_status, PaymentStatus::Unpaid);
        assert_eq!(pkg.party_size, 1);

        let stay = reservation(ReservationKind::HostStay);
        assert_eq!(stay.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_accept_is_idempotent() {
        let mut r = reservation(ReservationKind::Package);
        r.accept(Utc::now()).unwrap();
        let first = (r.status, r.payment_status);
        r.accept(Utc::now()).unwrap();
        assert_eq!((r.status, r.payment_status), first);
        assert_eq!(first, (BookingStatus::Accepted, PaymentStatus::Paid));
    }

    #[test]
    fn test_reject_sets_failed() {
        let mut r = reservation(ReservationKind::Package);
        r.reject(Utc::now()).unwrap();
        assert_eq!(r.status, BookingStatus::Rejected);
        assert_eq!(r.payment_status, PaymentStatus::Failed);

        // Terminal in both directions.
        assert!(matches!(r.accept(Utc::now()), Err(TransitionError::NotAllowed { .. })));
        let mut accepted = reservation(ReservationKind::Package);
        accepted.accept(Utc::now()).unwrap();
        assert!(matches!(accepted.reject(Utc::now()), Err(TransitionError::NotAllowed { .. })));
    }

    #[test]
    fn test_cancel_paid_goes_refund_pending() {
        let mut r = reservation(ReservationKind::HostStay);
        r.accept(Utc::now()).unwrap();
        r.cancel(CancelledBy::User, Utc::now()).unwrap();

        assert_eq!(r.status, BookingStatus::Cancelled);
        assert_eq!(r.payment_status, PaymentStatus::RefundPending);
        assert_eq!(r.cancelled_by, Some(CancelledBy::User));
        assert!(r.cancelled_at.is_some());
    }

    #[test]
    fn test_cancel_unpaid_goes_cancelled() {
        let mut r = reservation(ReservationKind::Package);
        r.cancel(CancelledBy::Admin, Utc::now()).unwrap();
        assert_eq!(r.payment_status, PaymentStatus::Cancelled);
        assert_eq!(r.cancelled_by, Some(CancelledBy::Admin));
    }

    #[test]
    fn test_cancel_twice_fails() {
        let mut r = reservation(ReservationKind::Package);
        r.cancel(CancelledBy::User, Utc::now()).unwrap();
        assert_eq!(
            r.cancel(CancelledBy::User, Utc::now()),
            Err(TransitionError::NotAllowed { action: "cancel", from: BookingStatus::Cancelled })
        );
    }

    #[test]
    fn test_cancel_at_or_after_check_in_fails() {
        let mut r = reservation(ReservationKind::Package);
        let check_in = r.check_in;
        assert_eq!(r.cancel(CancelledBy::User, check_in), Err(TransitionError::AfterCheckIn));
        assert_eq!(
            r.cancel(CancelledBy::User, check_in + Duration::hours(1)),
            Err(TransitionError::AfterCheckIn)
        );
        assert_eq!(r.status, BookingStatus::Pending);
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::AtProperty.label(ReservationKind::Package), "property");
        assert_eq!(PaymentMethod::AtProperty.label(ReservationKind::HostStay), "pay_at_property");
        assert_eq!("pay_at_property".parse::<PaymentMethod>(), Ok(PaymentMethod::AtProperty));
        assert_eq!("ONLINE".parse::<PaymentMethod>(), Ok(PaymentMethod::Online));
        assert!("card".parse::<PaymentMethod>().is_err());

        let parsed: PaymentMethod = serde_json::from_str("\"property\"").unwrap();
        assert_eq!(parsed, PaymentMethod::AtProperty);
    }
}
