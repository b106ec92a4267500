//! Hosted-invoice payment provider client
//!
//! The settlement core talks to the provider through [`InvoiceProvider`];
//! production wires in [`XenditClient`], tests substitute a mock. Keeping
//! the seam at the trait means invoice issuance logic never sees reqwest.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Invoice creation request sent to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct CreateInvoiceRequest {
    /// Our order id; the provider echoes it back in callbacks.
    pub external_id: String,
    pub amount: i64,
    pub payer_email: String,
    pub description: String,
    /// Validity window in seconds.
    pub invoice_duration: i64,
    pub success_redirect_url: String,
    pub failure_redirect_url: String,
}

/// Provider's view of a created invoice.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderInvoice {
    pub id: String,
    pub invoice_url: String,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait InvoiceProvider: Send + Sync {
    async fn create_invoice(
        &self,
        request: &CreateInvoiceRequest,
    ) -> Result<ProviderInvoice, ProviderError>;
}

/// Xendit-style REST client. Authenticates with the secret API key as the
/// basic-auth username and an empty password.
pub struct XenditClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl XenditClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl InvoiceProvider for XenditClient {
    async fn create_invoice(
        &self,
        request: &CreateInvoiceRequest,
    ) -> Result<ProviderInvoice, ProviderError> {
        let url = format!("{}/v2/invoices", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.api_key, None::<&str>)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ProviderInvoice>()
            .await
            .map_err(|e| ProviderError::Transport(format!("invalid provider response: {e}")))
    }
}
