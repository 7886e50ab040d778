use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::models::{Reservation, ReservationKind};

/// Row of the merged admin listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub id: Uuid,
    pub name: String,
    pub trip: String,
    pub amount: f64,
    pub payment_status: String,
    pub status: String,
    pub date: DateTime<Utc>,
    /// "package" or "host"
    pub source: String,
}

impl BookingSummary {
    pub fn new(reservation: &Reservation, trip: String) -> Self {
        Self {
            id: reservation.id,
            name: reservation.customer.name.clone(),
            trip,
            amount: reservation.amount,
            payment_status: reservation.payment_status.to_string(),
            status: reservation.status.to_string(),
            date: reservation.check_in,
            source: reservation.kind.source().to_string(),
        }
    }
}

/// External JSON shape of a reservation, using the field names of its kind
/// (`status`/`people`/`paymentMethod` for packages,
/// `bookingStatus`/`guests`/`paymentMode` for host stays).
pub fn reservation_json(r: &Reservation) -> Value {
    let fields = r.kind.fields();
    let mut out = Map::new();

    out.insert("id".into(), json!(r.id));
    out.insert("userId".into(), json!(r.user_id));
    out.insert(fields.subject.into(), json!(r.subject_id));
    if r.kind == ReservationKind::HostStay || r.host_id.is_some() {
        out.insert("hostId".into(), json!(r.host_id));
    }
    out.insert("name".into(), json!(r.customer.name));
    out.insert("email".into(), json!(r.customer.email));
    out.insert("phone".into(), json!(r.customer.phone));
    out.insert("checkIn".into(), json!(r.check_in));
    out.insert("checkOut".into(), json!(r.check_out));
    out.insert(fields.party_size.into(), json!(r.party_size));
    out.insert("amount".into(), json!(r.amount));
    out.insert("idProofUrl".into(), json!(r.id_proof_url));
    out.insert(fields.payment_method.into(), json!(r.payment_method.label(r.kind)));
    out.insert("paymentStatus".into(), json!(r.payment_status.as_str()));
    out.insert(fields.status.into(), json!(r.status.as_str()));

    let gateway = r.gateway.as_ref();
    out.insert(fields.order_id.into(), json!(gateway.map(|g| &g.order_id)));
    out.insert(fields.payment_id.into(), json!(gateway.map(|g| &g.payment_id)));
    out.insert(fields.signature.into(), json!(gateway.map(|g| &g.signature)));
    // Kind-neutral aliases for clients reading both kinds.
    out.insert("orderId".into(), json!(gateway.map(|g| &g.order_id)));
    out.insert("paymentId".into(), json!(gateway.map(|g| &g.payment_id)));
    out.insert("signature".into(), json!(gateway.map(|g| &g.signature)));

    out.insert("cancelledAt".into(), json!(r.cancelled_at));
    out.insert("cancelledBy".into(), json!(r.cancelled_by.map(|c| c.as_str())));
    out.insert("version".into(), json!(r.version));
    out.insert("createdAt".into(), json!(r.created_at));
    out.insert("updatedAt".into(), json!(r.updated_at));
    out.insert("source".into(), json!(r.kind.source()));

    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerSnapshot, GatewayReceipt, PaymentMethod};
    use chrono::Duration;
    use roam_catalog::StayRange;
    use roam_shared::Masked;

    fn reservation(kind: ReservationKind) -> Reservation {
        let check_in = Utc::now() + Duration::days(3);
        Reservation::new(
            kind,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            CustomerSnapshot {
                name: "Meera".into(),
                email: Masked::new("meera@example.com".into()),
                phone: Some(Masked::new("9999999999".into())),
            },
            StayRange::new(check_in, check_in + Duration::days(2)),
            2,
            4000.0,
            PaymentMethod::AtProperty,
            None,
        )
    }

    #[test]
    fn test_package_view_field_names() {
        let v = reservation_json(&reservation(ReservationKind::Package));
        assert_eq!(v["status"], "pending");
        assert_eq!(v["people"], 2);
        assert_eq!(v["paymentMethod"], "property");
        assert_eq!(v["paymentStatus"], "unpaid");
        assert_eq!(v["email"], "meera@example.com");
        assert!(v.get("packageId").is_some());
        assert!(v.get("bookingStatus").is_none());
    }

    #[test]
    fn test_host_view_field_names() {
        let mut r = reservation(ReservationKind::HostStay);
        r.mark_paid(
            GatewayReceipt {
                order_id: "order_1".into(),
                payment_id: "pay_1".into(),
                signature: "sig".into(),
            },
            Utc::now(),
        );
        let v = reservation_json(&r);
        assert_eq!(v["bookingStatus"], "pending");
        assert_eq!(v["guests"], 2);
        assert_eq!(v["paymentMode"], "pay_at_property");
        assert_eq!(v["paymentStatus"], "paid");
        assert_eq!(v["razorpayOrderId"], "order_1");
        assert!(v.get("listingId").is_some());
        assert!(v.get("status").is_none());
    }

    #[test]
    fn test_gateway_fields_have_neutral_names() {
        let mut r = reservation(ReservationKind::Package);
        let v = reservation_json(&r);
        assert!(v["orderId"].is_null());
        assert!(v["signature"].is_null());

        r.mark_paid(
            GatewayReceipt {
                order_id: "order_9".into(),
                payment_id: "pay_9".into(),
                signature: "sig_9".into(),
            },
            Utc::now(),
        );
        let v = reservation_json(&r);
        assert_eq!(v["razorpay_order_id"], "order_9");
        assert_eq!(v["orderId"], "order_9");
        assert_eq!(v["paymentId"], "pay_9");
        assert_eq!(v["signature"], "sig_9");
    }

    #[test]
    fn test_summary_row() {
        let r = reservation(ReservationKind::HostStay);
        let row = BookingSummary::new(&r, "Lake Cabin".into());
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["source"], "host");
        assert_eq!(v["trip"], "Lake Cabin");
        assert_eq!(v["paymentStatus"], "pending");
    }
}
