use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roam_shared::models::events::BookingFacts;
use std::fmt::Write;

/// A rendered invoice document.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedInvoice {
    pub content_type: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl RenderedInvoice {
    pub fn file_name(&self, booking_id: uuid::Uuid) -> String {
        format!("invoice_{}.{}", booking_id, self.extension)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("Invoice rendering failed: {0}")]
    Render(String),
}

/// Turns booking facts into a binary document.
#[async_trait]
pub trait InvoiceRenderer: Send + Sync {
    async fn render(&self, facts: &BookingFacts) -> Result<RenderedInvoice, InvoiceError>;
}

/// Plain-text invoice with the same sections as the printed one.
#[derive(Debug, Clone)]
pub struct TextInvoiceRenderer {
    brand: String,
}

impl TextInvoiceRenderer {
    pub fn new(brand: impl Into<String>) -> Self {
        Self { brand: brand.into() }
    }

    fn write_document(&self, facts: &BookingFacts) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        let row = |out: &mut String, label: &str, value: &str| writeln!(out, "{:<18}{}", label, value);

        writeln!(out, "{:^60}", "BOOKING INVOICE")?;
        writeln!(out, "{}", "=".repeat(60))?;

        row(&mut out, "Invoice ID:", &facts.booking_id.to_string())?;
        row(&mut out, "Customer Name:", &facts.customer_name)?;
        row(&mut out, "Email:", facts.customer_email.expose())?;
        row(
            &mut out,
            "Phone:",
            facts.customer_phone.as_ref().map(|p| p.expose().as_str()).unwrap_or("-"),
        )?;
        writeln!(out)?;

        row(&mut out, "Stay / Package:", &facts.title)?;
        row(&mut out, "Check-in:", &format_date(facts.check_in))?;
        row(&mut out, "Check-out:", &format_date(facts.check_out))?;
        row(&mut out, "Guests:", &facts.party_size.max(1).to_string())?;
        writeln!(out)?;

        writeln!(out, "Total Amount: {}", format_inr(facts.amount))?;
        writeln!(out)?;

        row(&mut out, "Payment Method:", &facts.payment_method.to_uppercase())?;
        row(&mut out, "Payment Status:", &facts.payment_status.to_uppercase())?;
        row(&mut out, "Booking Status:", &facts.booking_status.to_uppercase())?;
        writeln!(out)?;

        writeln!(out, "{:^60}", format!("Thank you for choosing {}!", self.brand))?;
        Ok(out)
    }
}

#[async_trait]
impl InvoiceRenderer for TextInvoiceRenderer {
    async fn render(&self, facts: &BookingFacts) -> Result<RenderedInvoice, InvoiceError> {
        let text = self
            .write_document(facts)
            .map_err(|e| InvoiceError::Render(e.to_string()))?;

        Ok(RenderedInvoice {
            content_type: "text/plain; charset=utf-8".to_string(),
            extension: "txt".to_string(),
            bytes: text.into_bytes(),
        })
    }
}

/// e.g. "Tue, 10 Mar 2026"
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y").to_string()
}

/// Indian digit grouping: 1234567.5 -> "₹ 12,34,567.50"
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = (paise / 100).to_string();
    let fraction = paise % 100;

    let grouped = if rupees.len() <= 3 {
        rupees
    } else {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            parts.push(&head[end - 2..end]);
            end -= 2;
        }
        parts.push(&head[..end]);
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    let sign = if negative { "-" } else { "" };
    if fraction == 0 {
        format!("₹ {}{}", sign, grouped)
    } else {
        format!("₹ {}{}.{:02}", sign, grouped, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use roam_shared::Masked;
    use uuid::Uuid;

    fn facts() -> BookingFacts {
        BookingFacts {
            booking_id: Uuid::nil(),
            source: "package".to_string(),
            title: "Ooty Hill Escape".to_string(),
            customer_name: "Asha".to_string(),
            customer_email: Masked::new("asha@example.com".to_string()),
            customer_phone: None,
            check_in: Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap(),
            check_out: Utc.with_ymd_and_hms(2026, 3, 13, 0, 0, 0).unwrap(),
            party_size: 2,
            amount: 3000.0,
            payment_method: "online".to_string(),
            payment_status: "paid".to_string(),
            booking_status: "accepted".to_string(),
        }
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(0.0), "₹ 0");
        assert_eq!(format_inr(999.0), "₹ 999");
        assert_eq!(format_inr(3000.0), "₹ 3,000");
        assert_eq!(format_inr(123456.0), "₹ 1,23,456");
        assert_eq!(format_inr(1234567.5), "₹ 12,34,567.50");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap()), "Tue, 10 Mar 2026");
    }

    #[tokio::test]
    async fn test_text_invoice_contents() {
        let renderer = TextInvoiceRenderer::new("WrongTurnClub");
        let doc = renderer.render(&facts()).await.unwrap();
        let text = String::from_utf8(doc.bytes.clone()).unwrap();

        assert!(text.contains("BOOKING INVOICE"));
        assert!(text.contains("Ooty Hill Escape"));
        assert!(text.contains("asha@example.com"));
        assert!(text.contains("Total Amount: ₹ 3,000"));
        assert!(text.contains("ACCEPTED"));
        assert!(text.contains("Thank you for choosing WrongTurnClub!"));
        assert_eq!(doc.file_name(Uuid::nil()), format!("invoice_{}.txt", Uuid::nil()));
    }
}
