use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use roam_booking::{reservation_json, CancelledBy, NewHostBooking, ReservationKind, StatusDecision};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::bookings::StatusRequest;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/host-bookings", post(create_host_booking))
        .route("/host-bookings/user/{user_id}", get(user_host_bookings))
        .route("/host-bookings/host/{host_id}", get(host_bookings))
        .route("/host-bookings/{id}/cancel", put(cancel_host_booking))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/host-bookings/{id}/status", put(update_status))
        .route("/admin/host-bookings", get(all_host_bookings))
}

async fn create_host_booking(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewHostBooking>,
) -> Result<Json<Value>, AppError> {
    let reservation = state.lifecycle.create_host_booking(req).await?;
    info!(booking_id = %reservation.id, listing_id = %reservation.subject_id, "Host stay requested");

    Ok(Json(json!({
        "message": "Host booking created",
        "booking": reservation_json(&reservation),
    })))
}

async fn user_host_bookings(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<Vec<Value>>, AppError> {
    let bookings = state.lifecycle.list_for_user(ReservationKind::HostStay, user_id).await?;
    Ok(Json(bookings.iter().map(reservation_json).collect()))
}

async fn host_bookings(
    State(state): State<AppState>,
    AppPath(host_id): AppPath<Uuid>,
) -> Result<Json<Vec<Value>>, AppError> {
    let bookings = state.lifecycle.list_for_host(host_id).await?;
    Ok(Json(bookings.iter().map(reservation_json).collect()))
}

async fn cancel_host_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    let outcome = state
        .lifecycle
        .cancel(ReservationKind::HostStay, id, CancelledBy::User)
        .await?;
    Ok(Json(json!({
        "message": "Host booking cancelled",
        "booking": reservation_json(&outcome.reservation),
    })))
}

async fn update_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<StatusRequest>,
) -> Result<Json<Value>, AppError> {
    let decision: StatusDecision = req.status.trim().parse()?;
    let outcome = state
        .lifecycle
        .update_status(ReservationKind::HostStay, id, decision)
        .await?;
    Ok(Json(json!({
        "message": format!("Host booking {}", outcome.reservation.status),
        "booking": reservation_json(&outcome.reservation),
    })))
}

async fn all_host_bookings(State(state): State<AppState>) -> Result<Json<Vec<Value>>, AppError> {
    let bookings = state.lifecycle.list_all(ReservationKind::HostStay).await?;
    Ok(Json(bookings.iter().map(reservation_json).collect()))
}
