use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use roam_core::invoice::{format_date, format_inr};
use roam_core::{Attachment, Email, InvoiceError, InvoiceRenderer, Notifier, NotifyError};
use roam_shared::models::events::{BookingCancelledEvent, BookingConfirmedEvent, BookingFacts, BookingReceivedEvent};
use roam_shared::models::events::LifecycleEvent;
use tokio::task::JoinHandle;

/// Failure channel of a detached side-effect task. Never reaches the caller
/// of the transition that spawned it.
#[derive(Debug, thiserror::Error)]
pub enum SideEffectError {
    #[error("Invoice: {0}")]
    Invoice(#[from] InvoiceError),
    #[error("Email: {0}")]
    Notify(#[from] NotifyError),
}

pub type SideEffectHandle = JoinHandle<Result<(), SideEffectError>>;

/// Mail and invoice work triggered by committed lifecycle events.
#[derive(Clone)]
pub struct SideEffects {
    notifier: Arc<dyn Notifier>,
    invoices: Arc<dyn InvoiceRenderer>,
    brand: String,
}

impl SideEffects {
    pub fn new(notifier: Arc<dyn Notifier>, invoices: Arc<dyn InvoiceRenderer>, brand: impl Into<String>) -> Self {
        Self {
            notifier,
            invoices,
            brand: brand.into(),
        }
    }

    pub fn invoices(&self) -> &Arc<dyn InvoiceRenderer> {
        &self.invoices
    }

    /// Spawns the work for `event` on the runtime and returns immediately.
    /// The task logs its own failure; awaiting the handle is optional.
    pub fn dispatch(&self, event: LifecycleEvent) -> SideEffectHandle {
        let this = self.clone();
        tokio::spawn(async move {
            let name = event.name();
            let booking_id = event.booking_id();
            let result = this.run(event).await;
            if let Err(e) = &result {
                tracing::warn!(%booking_id, event = name, error = %e, "Side effect failed");
            }
            result
        })
    }

    async fn run(&self, event: LifecycleEvent) -> Result<(), SideEffectError> {
        match event {
            LifecycleEvent::BookingReceived(e) => self.deliver(&self.received_email(&e)).await?,
            LifecycleEvent::BookingConfirmed(e) => {
                let invoice = self.invoices.render(&e.facts).await?;
                let email = self.confirmed_email(&e).attach(Attachment {
                    filename: invoice.file_name(e.facts.booking_id),
                    content_type: invoice.content_type,
                    content: invoice.bytes,
                });
                self.deliver(&email).await?
            }
            LifecycleEvent::BookingCancelled(e) => self.deliver(&self.cancelled_email(&e)).await?,
            LifecycleEvent::PaymentCaptured(e) => {
                tracing::info!(booking_id = %e.booking_id, order_id = %e.order_id, "Payment captured");
            }
        }
        Ok(())
    }

    async fn deliver(&self, email: &Email) -> Result<(), SideEffectError> {
        if email.to.is_empty() {
            tracing::info!(subject = %email.subject, "No recipient on file, mail skipped");
            return Ok(());
        }
        self.notifier.send(email).await?;
        Ok(())
    }

    fn received_email(&self, event: &BookingReceivedEvent) -> Email {
        let f = &event.facts;
        Email::new(
            f.customer_email.expose(),
            format!("Booking Received - {}", self.brand),
            format!(
                "<h3>Hello {},</h3>\
                 <p>Your booking for <b>{}</b> has been received.</p>\
                 <p>We will confirm shortly.</p>\
                 <br/><b>- {}</b>",
                escape_html(&f.customer_name),
                escape_html(&f.title),
                escape_html(&self.brand),
            ),
        )
    }

    fn confirmed_email(&self, event: &BookingConfirmedEvent) -> Email {
        let f = &event.facts;
        let subject = match f.source.as_str() {
            "host" => format!("Host Stay Booking Confirmed - {}", self.brand),
            _ => format!("Booking Confirmed - {}", self.brand),
        };
        Email::new(
            f.customer_email.expose(),
            subject,
            format!(
                "<h3>Hello {}</h3>\
                 <p>Your booking for <b>{}</b> is confirmed.</p>\
                 {}\
                 <br/><b>Invoice attached.</b>",
                escape_html(&f.customer_name),
                escape_html(&f.title),
                stay_summary(f),
            ),
        )
    }

    fn cancelled_email(&self, event: &BookingCancelledEvent) -> Email {
        let f = &event.facts;
        let refund_note = if event.refund_pending {
            "Refund will be processed in 5-7 working days."
        } else {
            "No payment was captured."
        };
        Email::new(
            f.customer_email.expose(),
            format!("Booking Cancelled - {}", self.brand),
            format!(
                "<h3>Hello {},</h3>\
                 <p>Your booking for <b>{}</b> has been cancelled.</p>\
                 <p>Check-in: {}</p>\
                 <p>{}</p>\
                 <br/><b>- {}</b>",
                escape_html(&f.customer_name),
                escape_html(&f.title),
                format_date(f.check_in),
                refund_note,
                escape_html(&self.brand),
            ),
        )
    }
}

fn stay_summary(f: &BookingFacts) -> String {
    format!(
        "<p><b>Check-in:</b> {}</p><p><b>Check-out:</b> {}</p><p><b>Amount:</b> {}</p>",
        format_date(f.check_in),
        format_date(f.check_out),
        format_inr(f.amount),
    )
}

/// Customer-supplied text goes into HTML bodies.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Notifier double that keeps every message it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Email>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .push(email.clone());
        Ok(())
    }
}

/// Notifier double whose transport is always down.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _email: &Email) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("connection refused".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use roam_core::TextInvoiceRenderer;
    use roam_shared::Masked;
    use uuid::Uuid;

    fn facts(source: &str) -> BookingFacts {
        let check_in = Utc::now() + Duration::days(5);
        BookingFacts {
            booking_id: Uuid::new_v4(),
            source: source.to_string(),
            title: "Spiti <Valley>".to_string(),
            customer_name: "Ravi & Co".to_string(),
            customer_email: Masked::new("ravi@example.com".to_string()),
            customer_phone: None,
            check_in,
            check_out: check_in + Duration::days(2),
            party_size: 2,
            amount: 3000.0,
            payment_method: "online".to_string(),
            payment_status: "paid".to_string(),
            booking_status: "accepted".to_string(),
        }
    }

    fn effects(notifier: Arc<dyn Notifier>) -> SideEffects {
        SideEffects::new(notifier, Arc::new(TextInvoiceRenderer::new("Roam")), "Roam")
    }

    #[tokio::test]
    async fn test_confirmation_carries_invoice() {
        let notifier = Arc::new(RecordingNotifier::new());
        let fx = effects(notifier.clone());
        let facts = facts("package");
        let id = facts.booking_id;

        fx.dispatch(LifecycleEvent::BookingConfirmed(BookingConfirmedEvent { facts, timestamp: 0 }))
            .await
            .unwrap()
            .unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ravi@example.com");
        assert_eq!(sent[0].subject, "Booking Confirmed - Roam");
        assert!(sent[0].html.contains("Spiti &lt;Valley&gt;"));
        assert!(sent[0].html.contains("Ravi &amp; Co"));
        let attachment = sent[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.filename, format!("invoice_{}.txt", id));
        assert!(!attachment.content.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_mentions_refund() {
        let notifier = Arc::new(RecordingNotifier::new());
        let fx = effects(notifier.clone());

        fx.dispatch(LifecycleEvent::BookingCancelled(BookingCancelledEvent {
            facts: facts("host"),
            cancelled_by: "user".to_string(),
            refund_pending: true,
            timestamp: 0,
        }))
        .await
        .unwrap()
        .unwrap();

        let sent = notifier.sent();
        assert!(sent[0].html.contains("Refund will be processed"));
        assert!(sent[0].attachment.is_none());
    }

    #[tokio::test]
    async fn test_failure_stays_in_task() {
        let fx = effects(Arc::new(FailingNotifier));
        let result = fx
            .dispatch(LifecycleEvent::BookingReceived(BookingReceivedEvent { facts: facts("package"), timestamp: 0 }))
            .await
            .unwrap();
        assert!(matches!(result, Err(SideEffectError::Notify(NotifyError::Transport(_)))));
    }

    #[tokio::test]
    async fn test_guest_without_email_gets_no_mail() {
        let notifier = Arc::new(RecordingNotifier::new());
        let fx = effects(notifier.clone());
        let mut facts = facts("host");
        facts.customer_email = Masked::new(String::new());

        fx.dispatch(LifecycleEvent::BookingConfirmed(BookingConfirmedEvent { facts, timestamp: 0 }))
            .await
            .unwrap()
            .unwrap();

        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }
}
