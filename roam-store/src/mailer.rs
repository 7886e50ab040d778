use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment as MailAttachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use roam_core::{Email, Notifier, NotifyError};
use roam_shared::Masked;

use crate::app_config::EmailConfig;

/// SMTP delivery via lettre with STARTTLS.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl SmtpNotifier {
    pub fn new(cfg: &EmailConfig, host: &str) -> Result<Self, NotifyError> {
        let from: Mailbox = cfg
            .from
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("{}: {}", cfg.from, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| NotifyError::Transport(format!("Failed to create SMTP transport: {}", e)))?
            .port(cfg.smtp_port);

        if let (Some(username), Some(password)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            host: host.to_string(),
        })
    }

    fn build_message(&self, email: &Email) -> Result<Message, NotifyError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| NotifyError::InvalidAddress(Masked::new(email.to.clone()).hint()))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject);

        let message = match &email.attachment {
            None => builder
                .header(ContentType::TEXT_HTML)
                .body(email.html.clone()),
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|e| NotifyError::Build(e.to_string()))?;
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::html(email.html.clone()))
                        .singlepart(
                            MailAttachment::new(attachment.filename.clone())
                                .body(attachment.content.clone(), content_type),
                        ),
                )
            }
        };

        message.map_err(|e| NotifyError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier").field("host", &self.host).finish()
    }
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        tracing::info!(
            to = %Masked::new(email.to.clone()).hint(),
            subject = %email.subject,
            attachment = email.attachment.as_ref().map(|a| a.filename.as_str()),
            "Email not delivered, no SMTP host configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_core::Attachment;

    fn config() -> EmailConfig {
        EmailConfig {
            from: "Roam <noreply@roam.test>".to_string(),
            smtp_host: Some("localhost".to_string()),
            smtp_port: 2525,
            username: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn test_builds_message_with_attachment() {
        let notifier = SmtpNotifier::new(&config(), "localhost").unwrap();
        let email = Email::new("asha@example.com", "Booking Confirmed", "<p>hi</p>").attach(Attachment {
            filename: "invoice_1.txt".into(),
            content_type: "text/plain; charset=utf-8".into(),
            content: b"INVOICE".to_vec(),
        });

        let message = notifier.build_message(&email).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("Subject: Booking Confirmed"));
        assert!(raw.contains("invoice_1.txt"));
    }

    #[tokio::test]
    async fn test_rejects_bad_recipient() {
        let notifier = SmtpNotifier::new(&config(), "localhost").unwrap();
        let err = notifier
            .build_message(&Email::new("not-an-address", "s", "b"))
            .unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        assert!(LogNotifier.send(&Email::new("a@b.c", "s", "b")).await.is_ok());
    }
}
