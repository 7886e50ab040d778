use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Order creation request in the gateway's own units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    /// Minor currency units (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Order object as returned by the gateway; passed back to the client untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayOrder {
    pub id: String, // Provider's ID (e.g., order_Nx1...)
    #[serde(default)]
    pub entity: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway unreachable: {0}")]
    Transport(String),
    #[error("Gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected gateway response: {0}")]
    Decode(String),
}

/// Converts a major-unit amount (rupees) to rounded minor units (paise).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment order with the provider
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;

    fn name(&self) -> &'static str;
}
