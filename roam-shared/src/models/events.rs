use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

/// Normalized, kind-independent facts about a reservation.
/// Feeds outgoing mail and the invoice renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFacts {
    pub booking_id: Uuid,
    /// "package" or "host"
    pub source: String,
    pub title: String,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub customer_phone: Option<Masked<String>>,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub party_size: u32,
    pub amount: f64,
    pub payment_method: String,
    pub payment_status: String,
    pub booking_status: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingReceivedEvent {
    pub facts: BookingFacts,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub facts: BookingFacts,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub facts: BookingFacts,
    pub cancelled_by: String,
    pub refund_pending: bool,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaymentCapturedEvent {
    pub booking_id: Uuid,
    pub order_id: String,
    pub payment_id: String,
    pub timestamp: i64,
}

/// Emitted by the lifecycle manager after a transition has been committed.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    BookingReceived(BookingReceivedEvent),
    BookingConfirmed(BookingConfirmedEvent),
    BookingCancelled(BookingCancelledEvent),
    PaymentCaptured(PaymentCapturedEvent),
}

impl LifecycleEvent {
    pub fn booking_id(&self) -> Uuid {
        match self {
            LifecycleEvent::BookingReceived(e) => e.facts.booking_id,
            LifecycleEvent::BookingConfirmed(e) => e.facts.booking_id,
            LifecycleEvent::BookingCancelled(e) => e.facts.booking_id,
            LifecycleEvent::PaymentCaptured(e) => e.booking_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::BookingReceived(_) => "booking.received",
            LifecycleEvent::BookingConfirmed(_) => "booking.confirmed",
            LifecycleEvent::BookingCancelled(_) => "booking.cancelled",
            LifecycleEvent::PaymentCaptured(_) => "payment.captured",
        }
    }
}
