use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use roam_core::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway};
use roam_shared::Masked;
use serde::Deserialize;

use crate::app_config::PaymentsConfig;

/// Razorpay Orders API client (`POST {base_url}/v1/orders`, basic auth).
#[derive(Clone)]
pub struct RazorpayClient {
    http: Client,
    base_url: String,
    key_id: String,
    key_secret: Masked<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    description: String,
}

impl RazorpayClient {
    pub fn new(cfg: &PaymentsConfig) -> Result<Self, GatewayError> {
        let timeout = Duration::from_millis(if cfg.timeout_ms > 0 { cfg.timeout_ms } else { 10_000 });
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            key_id: cfg.key_id.clone(),
            key_secret: Masked::new(cfg.key_secret.clone()),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(self.key_secret.expose()))
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.description,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "razorpay"
    }
}
