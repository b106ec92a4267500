//! Payment Webhook Handler
//!
//! The boundary contract the provider depends on: 401 for a bad token,
//! otherwise always 200 `{received: true}` - even when internal
//! reconciliation fails. A non-2xx answer would make the provider burn its
//! redelivery retries against a transient internal error; failures are
//! logged for operator follow-up instead.

use axum::{Json, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::core::ServerState;
use crate::payments::webhook;
use crate::utils::{AppError, AppResult};
use shared::models::InvoiceCallback;

const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/payments/webhook - provider settlement callback
pub async fn webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<WebhookAck>> {
    verify_callback_token(&state, &headers)?;

    // Everything after authentication acknowledges: parse failures and
    // internal errors are logged, never bounced back to the provider.
    let callback: InvoiceCallback = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, body = %body, "Unparseable webhook payload, acknowledging");
            return Ok(Json(WebhookAck { received: true }));
        }
    };

    match webhook::process_callback(state.pool(), &callback, &body).await {
        Ok(outcome) => {
            tracing::debug!(?outcome, external_id = %callback.external_id, "Webhook processed");
        }
        Err(e) => {
            tracing::error!(
                external_id = %callback.external_id,
                status = %callback.status,
                error = %e,
                payload = %body,
                "Webhook reconciliation failed; acknowledged for provider retry semantics"
            );
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

/// Token verification is mandatory. An empty configured token fails closed:
/// no delivery is accepted until the operator sets one.
fn verify_callback_token(state: &ServerState, headers: &HeaderMap) -> Result<(), AppError> {
    let configured = &state.config.payment_callback_token;
    if configured.is_empty() {
        tracing::warn!("Webhook rejected: no callback token configured");
        return Err(AppError::Unauthorized);
    }

    let presented = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if presented != configured {
        tracing::warn!("Webhook rejected: callback token mismatch");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
