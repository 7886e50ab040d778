use axum::{extract::State, routing::post, Json, Router};
use roam_booking::{reservation_json, PaymentConfirmation};
use roam_core::GatewayOrder;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: f64,
    pub receipt: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments/create-order", post(create_order))
        .route("/payments/verify", post(verify_payment))
}

async fn create_order(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateOrderRequest>,
) -> Result<Json<GatewayOrder>, AppError> {
    let order = state.payments.create_order(req.amount, req.receipt).await?;
    Ok(Json(order))
}

async fn verify_payment(
    State(state): State<AppState>,
    AppJson(confirmation): AppJson<PaymentConfirmation>,
) -> Result<Json<Value>, AppError> {
    let outcome = state.payments.confirm_payment(confirmation).await?;
    Ok(Json(json!({
        "message": "Payment verified",
        "bookingId": outcome.reservation.id,
        "booking": reservation_json(&outcome.reservation),
    })))
}
