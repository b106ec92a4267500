//! Invoice Issuer
//!
//! Requests a hosted payment page for an online-payment order and persists
//! the reference. Idempotent per order: once `invoice_id` is set, repeat
//! calls return the stored fields without a second provider round trip.
//!
//! On provider failure nothing is persisted, so the caller can simply retry.

use serde::Serialize;

use crate::core::ServerState;
use crate::db::repository::{order, payment, user};
use crate::payments::provider::CreateInvoiceRequest;
use crate::utils::{AppError, AppResult};
use shared::models::PaymentMethod;
use shared::util::now_millis;

/// Response body of `POST /api/orders/{id}/invoice`.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceIssued {
    pub invoice_id: String,
    pub invoice_url: String,
    /// Epoch millis; mirrors `orders.payment_deadline`.
    pub expiry_date: i64,
}

pub async fn issue_invoice(state: &ServerState, order_id: i64) -> AppResult<InvoiceIssued> {
    let pool = &state.db.pool;
    let existing = order::get(pool, order_id).await?;

    if existing.payment_method != PaymentMethod::Invoice {
        return Err(AppError::Validation(
            "Order is not payable by hosted invoice".into(),
        ));
    }

    // Idempotency: an already-issued order answers from storage.
    if let (Some(invoice_id), Some(invoice_url), Some(deadline)) = (
        existing.invoice_id.clone(),
        existing.invoice_url.clone(),
        existing.payment_deadline,
    ) {
        return Ok(InvoiceIssued {
            invoice_id,
            invoice_url,
            expiry_date: deadline,
        });
    }

    let buyer = user::get(pool, existing.buyer_id).await?;
    let duration_secs = state.config.invoice_duration_hours * 3600;

    let request = CreateInvoiceRequest {
        external_id: existing.id.to_string(),
        amount: existing.total,
        payer_email: buyer.email,
        description: format!("Order {}", existing.order_number),
        invoice_duration: duration_secs,
        success_redirect_url: state.config.payment_success_redirect_url.clone(),
        failure_redirect_url: state.config.payment_failure_redirect_url.clone(),
    };

    let issued = state
        .invoice_provider
        .create_invoice(&request)
        .await
        .map_err(|e| AppError::PaymentProvider(e.to_string()))?;

    let payment_deadline = now_millis() + duration_secs * 1000;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let claimed = order::set_invoice_fields(
        &mut tx,
        existing.id,
        &issued.id,
        &issued.invoice_url,
        payment_deadline,
    )
    .await?;
    if !claimed {
        // A concurrent call won the race after our provider request; answer
        // with what it persisted.
        drop(tx);
        let current = order::get(pool, order_id).await?;
        if let (Some(invoice_id), Some(invoice_url), Some(deadline)) =
            (current.invoice_id, current.invoice_url, current.payment_deadline)
        {
            return Ok(InvoiceIssued {
                invoice_id,
                invoice_url,
                expiry_date: deadline,
            });
        }
        return Err(AppError::Conflict(format!(
            "Invoice already issued for order {order_id}"
        )));
    }

    payment::insert_pending(
        &mut tx,
        existing.id,
        PaymentMethod::Invoice,
        &issued.id,
        existing.total,
    )
    .await?;

    tx.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(
        order_id = existing.id,
        invoice_id = %issued.id,
        "Hosted invoice issued"
    );

    Ok(InvoiceIssued {
        invoice_id: issued.id,
        invoice_url: issued.invoice_url,
        expiry_date: payment_deadline,
    })
}
