use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use roam_core::payment::to_minor_units;
use roam_core::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway, SignatureVerifier};
use roam_shared::models::events::{LifecycleEvent, PaymentCapturedEvent};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{LifecycleError, LifecycleResult};
use crate::manager::TransitionOutcome;
use crate::models::{GatewayReceipt, ReservationKind};
use crate::notifications::SideEffects;
use crate::repository::ReservationRepository;

/// Gateway callback payload. Accepts both the package (`razorpay_*`) and the
/// host-stay (`razorpay*`) spellings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub booking_id: Option<String>,
    /// Narrows the booking lookup; both kinds are searched when absent.
    #[serde(default)]
    pub kind: Option<ReservationKind>,
    #[serde(default, alias = "razorpay_order_id", alias = "razorpayOrderId")]
    pub order_id: String,
    #[serde(default, alias = "razorpay_payment_id", alias = "razorpayPaymentId")]
    pub payment_id: String,
    #[serde(default, alias = "razorpay_signature", alias = "razorpaySignature")]
    pub signature: String,
}

/// Creates gateway orders and reconciles signed confirmations with bookings.
#[derive(Clone)]
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    verifier: SignatureVerifier,
    reservations: Arc<dyn ReservationRepository>,
    side_effects: SideEffects,
    currency: String,
}

impl PaymentOrchestrator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        verifier: SignatureVerifier,
        reservations: Arc<dyn ReservationRepository>,
        side_effects: SideEffects,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            verifier,
            reservations,
            side_effects,
            currency: currency.into(),
        }
    }

    /// `amount` is in major units and is sent to the gateway rounded to minor units.
    pub async fn create_order(&self, amount: f64, receipt: Option<String>) -> LifecycleResult<GatewayOrder> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LifecycleError::Validation("amount must be greater than zero".to_string()));
        }

        let request = OrderRequest {
            amount: to_minor_units(amount),
            currency: self.currency.clone(),
            receipt: receipt
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| format!("order_rcpt_{}", Utc::now().timestamp_millis())),
        };

        let order = self.gateway.create_order(&request).await.map_err(|e| {
            tracing::error!(gateway = self.gateway.name(), error = %e, "Order creation failed");
            LifecycleError::Upstream(e.to_string())
        })?;

        tracing::info!(order_id = %order.id, amount = request.amount, "Gateway order created");
        Ok(order)
    }

    /// Verifies the signature, then records the payment on the booking.
    /// A bad signature changes nothing.
    pub async fn confirm_payment(&self, confirmation: PaymentConfirmation) -> LifecycleResult<TransitionOutcome> {
        let booking_id = confirmation
            .booking_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LifecycleError::Validation("bookingId is required".to_string()))?;
        let booking_id = Uuid::parse_str(booking_id)
            .map_err(|_| LifecycleError::Validation("bookingId is not a valid id".to_string()))?;

        let verified = self
            .verifier
            .verify(&confirmation.order_id, &confirmation.payment_id, &confirmation.signature)?;
        if !verified {
            tracing::warn!(%booking_id, order_id = %confirmation.order_id, "Payment signature mismatch");
            return Err(LifecycleError::InvalidSignature);
        }

        let found = match confirmation.kind {
            Some(kind) => self.reservations.get(kind, booking_id).await?,
            None => self.reservations.locate(booking_id).await?,
        };
        let mut reservation = found.ok_or_else(|| LifecycleError::NotFound("Booking".to_string()))?;

        let expected = reservation.version;
        reservation.mark_paid(
            GatewayReceipt {
                order_id: confirmation.order_id.clone(),
                payment_id: confirmation.payment_id.clone(),
                signature: confirmation.signature,
            },
            Utc::now(),
        );
        let reservation = self.reservations.update(&reservation, expected).await?;

        let handle = self.side_effects.dispatch(LifecycleEvent::PaymentCaptured(PaymentCapturedEvent {
            booking_id,
            order_id: confirmation.order_id,
            payment_id: confirmation.payment_id,
            timestamp: Utc::now().timestamp_millis(),
        }));

        Ok(TransitionOutcome {
            reservation,
            side_effect: Some(handle),
        })
    }
}

/// In-process gateway for tests and local runs without credentials.
#[derive(Debug, Default)]
pub struct StaticGateway {
    issued: AtomicU64,
    fail: bool,
}

impl StaticGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that refuses every order.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }
}

#[async_trait]
impl PaymentGateway for StaticGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        if self.fail {
            return Err(GatewayError::Transport("Simulated gateway outage".to_string()));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayOrder {
            id: format!("order_static_{}", n),
            entity: "order".to_string(),
            amount: request.amount,
            amount_paid: 0,
            amount_due: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            status: "created".to_string(),
            attempts: 0,
            created_at: Utc::now().timestamp(),
        })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
