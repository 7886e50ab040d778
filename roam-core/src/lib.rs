pub mod artifact;
pub mod invoice;
pub mod notifier;
pub mod payment;
pub mod signature;

pub use artifact::{ArtifactError, ArtifactStore};
pub use invoice::{InvoiceError, InvoiceRenderer, RenderedInvoice, TextInvoiceRenderer};
pub use notifier::{Attachment, Email, Notifier, NotifyError};
pub use payment::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway};
pub use signature::SignatureVerifier;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
