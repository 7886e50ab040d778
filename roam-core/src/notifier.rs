use async_trait::async_trait;

/// File attached to an outgoing email.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// A templated message ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachment: Option<Attachment>,
}

impl Email {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
            attachment: None,
        }
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
    #[error("Failed to build message: {0}")]
    Build(String),
    #[error("Delivery failed: {0}")]
    Transport(String),
}

/// Outbound mail. Callers treat failures as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}
