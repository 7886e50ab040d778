use axum::{
    extract::{Multipart, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use roam_booking::{
    reservation_json, BookingSummary, CancelledBy, NewPackageBooking, PaymentMethod, ReservationKind, StatusDecision,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/user/{user_id}", get(user_bookings))
        .route("/bookings/{id}/cancel", put(cancel_booking))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings/{id}/status", put(update_status))
        .route("/admin/bookings", get(admin_overview))
        .route("/admin/bookings/{id}/cancel", put(admin_cancel))
}

/// Accepts a date-time or a bare `YYYY-MM-DD` (taken as midnight UTC).
pub(crate) fn parse_date(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| AppError::ValidationError(format!("{} is not a valid date", field)))
}

pub(crate) fn parse_id(field: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::ValidationError(format!("{} is not a valid id", field)))
}

#[derive(Debug, Default)]
struct BookingForm {
    user_id: Option<String>,
    package_id: Option<String>,
    name: String,
    email: String,
    phone: Option<String>,
    check_in: Option<String>,
    check_out: Option<String>,
    people: Option<String>,
    payment_method: Option<String>,
    id_proof_url: Option<String>,
}

impl BookingForm {
    fn into_request(self) -> Result<NewPackageBooking, AppError> {
        fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, AppError> {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::ValidationError(format!("{} is required", field)))
        }

        let people = match self.people.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Some(
                p.parse::<u32>()
                    .map_err(|_| AppError::ValidationError("people must be a whole number".to_string()))?,
            ),
            None => None,
        };
        let payment_method = match self.payment_method.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p.parse::<PaymentMethod>().map_err(AppError::ValidationError)?,
            None => PaymentMethod::default(),
        };

        Ok(NewPackageBooking {
            user_id: parse_id("userId", required("userId", &self.user_id)?)?,
            package_id: parse_id("packageId", required("packageId", &self.package_id)?)?,
            check_in: parse_date("checkIn", required("checkIn", &self.check_in)?)?,
            check_out: parse_date("checkOut", required("checkOut", &self.check_out)?)?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            people,
            payment_method,
            id_proof_url: self.id_proof_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

async fn create_booking(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<Value>, AppError> {
    let mut form = BookingForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "idProof" {
            let file_name = field.file_name().unwrap_or("id-proof").to_string();
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                form.id_proof_url = Some(state.artifacts.put(&file_name, bytes.to_vec()).await?);
            }
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "userId" => form.user_id = Some(value),
            "packageId" => form.package_id = Some(value),
            "name" => form.name = value,
            "email" => form.email = value,
            "phone" => form.phone = Some(value),
            "checkIn" => form.check_in = Some(value),
            "checkOut" => form.check_out = Some(value),
            "people" => form.people = Some(value),
            "paymentMethod" => form.payment_method = Some(value),
            // An uploaded file wins over a pre-hosted URL.
            "idProofUrl" if form.id_proof_url.is_none() => form.id_proof_url = Some(value),
            _ => {}
        }
    }

    let outcome = state.lifecycle.create_package_booking(form.into_request()?).await?;
    info!(booking_id = %outcome.reservation.id, "Package booking received");

    Ok(Json(json!({
        "message": "Booking created",
        "booking": reservation_json(&outcome.reservation),
    })))
}

async fn user_bookings(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<Vec<Value>>, AppError> {
    let bookings = state.lifecycle.list_for_user(ReservationKind::Package, user_id).await?;
    Ok(Json(bookings.iter().map(reservation_json).collect()))
}

async fn cancel_booking(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<Json<Value>, AppError> {
    let outcome = state
        .lifecycle
        .cancel(ReservationKind::Package, id, CancelledBy::User)
        .await?;
    Ok(Json(json!({
        "message": "Booking cancelled",
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
        .update_status(ReservationKind::Package, id, decision)
        .await?;
    Ok(Json(json!({
        "message": format!("Booking {}", outcome.reservation.status),
        "booking": reservation_json(&outcome.reservation),
    })))
}

async fn admin_overview(State(state): State<AppState>) -> Result<Json<Vec<BookingSummary>>, AppError> {
    Ok(Json(state.lifecycle.admin_overview().await?))
}

async fn admin_cancel(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<Json<Value>, AppError> {
    let outcome = state.lifecycle.cancel_any(id, CancelledBy::Admin).await?;
    Ok(Json(json!({
        "message": "Booking cancelled by admin",
        "booking": reservation_json(&outcome.reservation),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_both_shapes() {
        let day = parse_date("checkIn", "2026-12-24").unwrap();
        assert_eq!(day.to_rfc3339(), "2026-12-24T00:00:00+00:00");

        let precise = parse_date("checkIn", "2026-12-24T10:30:00+05:30").unwrap();
        assert_eq!(precise.to_rfc3339(), "2026-12-24T05:00:00+00:00");

        assert!(matches!(parse_date("checkIn", "24/12/2026"), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_form_requires_ids_and_dates() {
        let form = BookingForm {
            user_id: Some(Uuid::new_v4().to_string()),
            package_id: Some(Uuid::new_v4().to_string()),
            check_in: Some("2026-12-24".into()),
            ..Default::default()
        };
        let err = form.into_request().unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "checkOut is required"));
    }

    #[test]
    fn test_form_defaults_payment_method_and_people() {
        let form = BookingForm {
            user_id: Some(Uuid::new_v4().to_string()),
            package_id: Some(Uuid::new_v4().to_string()),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            check_in: Some("2026-12-24".into()),
            check_out: Some("2026-12-28".into()),
            people: Some(" ".into()),
            ..Default::default()
        };
        let req = form.into_request().unwrap();
        assert_eq!(req.people, None);
        assert_eq!(req.payment_method, PaymentMethod::AtProperty);
    }
}
