//! Order Builder
//!
//! Turns a validated cart into a persisted order, its line items and the
//! stock holds backing them, all inside one transaction, so a reservation
//! failure on the third line unwinds the holds already taken for the first
//! two.
//!
//! Unit prices come from the product rows read inside the transaction; the
//! client payload only carries product ids and quantities.

use crate::coupons;
use crate::core::ServerState;
use crate::db::repository::{Tx, coupon, order, product, user};
use crate::orders::number;
use crate::stock::ledger;
use crate::utils::validation::{MAX_CART_LINES, MAX_COUPON_CODE_LEN, validate_id, validate_quantity, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{
    Order, OrderCreate, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, Product,
};
use shared::util::{now_millis, snowflake_id};

/// Create an order from a cart.
///
/// On success the order is persisted `pending`/`pending` with one `active`
/// reservation per line (COD orders confirm their holds immediately; there
/// is no settlement step to wait for). Any failure rolls back everything.
pub async fn create_order(state: &ServerState, payload: OrderCreate) -> AppResult<Order> {
    validate_payload(&payload)?;

    let pool = &state.db.pool;

    let buyer = user::find_by_id(pool, payload.buyer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Buyer {} not found", payload.buyer_id)))?;

    let address = user::find_address(pool, payload.shipping_address_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Shipping address {} not found",
                payload.shipping_address_id
            ))
        })?;
    if address.user_id != buyer.id {
        return Err(AppError::Validation(
            "Shipping address does not belong to the buyer".into(),
        ));
    }

    let mut tx = pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

    // Resolve products and compute the subtotal from server-side prices.
    let mut lines: Vec<(Product, i64)> = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let product = product::find_by_id_tx(&mut tx, item.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", item.product_id)))?;
        if product.store_id != payload.store_id {
            return Err(AppError::Validation(format!(
                "Product '{}' does not belong to store {}",
                product.name, payload.store_id
            )));
        }
        if !product.is_active {
            return Err(AppError::Validation(format!(
                "Product '{}' is no longer available",
                product.name
            )));
        }
        lines.push((product, item.quantity));
    }

    let subtotal: i64 = lines.iter().map(|(p, qty)| p.price * qty).sum();
    let shipping_fee = state.shipping.quote(payload.store_id, subtotal);

    // Coupon eligibility (reads only; the consuming write happens below,
    // inside this transaction).
    let assessment = match &payload.coupon_code {
        Some(code) => {
            Some(coupons::validate_coupon(pool, code, Some(buyer.id), subtotal).await?)
        }
        None => None,
    };
    let discount = assessment.as_ref().map_or(0, |a| a.discount);

    let total = subtotal + shipping_fee - discount;
    let now = now_millis();

    let new_order = Order {
        id: snowflake_id(),
        order_number: String::new(), // claimed below
        buyer_id: buyer.id,
        store_id: payload.store_id,
        subtotal,
        shipping_fee,
        discount,
        total,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method: payload.payment_method,
        shipping_address_id: address.id,
        coupon_code: assessment.as_ref().map(|a| a.coupon.code.clone()),
        invoice_id: None,
        invoice_url: None,
        payment_deadline: None,
        created_at: now,
        updated_at: now,
    };
    let new_order = insert_with_fresh_number(&mut tx, new_order).await?;

    for (product, quantity) in &lines {
        let item = OrderItem {
            id: snowflake_id(),
            order_id: new_order.id,
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: *quantity,
            unit_price: product.price,
            line_total: product.price * quantity,
        };
        order::insert_item(&mut tx, &item).await?;

        // A failed hold returns Err and drops the transaction, unwinding the
        // holds already taken for earlier lines.
        ledger::reserve(
            &mut tx,
            product.id,
            new_order.id,
            *quantity,
            state.config.reservation_ttl_millis(),
        )
        .await?;
    }

    if let Some(assessment) = &assessment {
        let redeemed = coupon::redeem(
            &mut tx,
            assessment.coupon.id,
            new_order.id,
            buyer.id,
            assessment.discount,
        )
        .await?;
        if !redeemed {
            // A concurrent checkout consumed the last use after we validated.
            return Err(AppError::InvalidCoupon(
                "Coupon usage limit has been reached".into(),
            ));
        }
    }

    // Cash on delivery has no settlement webhook; the sale is committed at
    // checkout and the stock leaves the shelf now.
    if payload.payment_method == PaymentMethod::Cod {
        ledger::confirm_for_order(&mut tx, new_order.id).await?;
    }

    tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(
        order_id = new_order.id,
        order_number = %new_order.order_number,
        buyer_id = new_order.buyer_id,
        total = new_order.total,
        "Order created"
    );

    Ok(new_order)
}

fn validate_payload(payload: &OrderCreate) -> AppResult<()> {
    validate_id(payload.buyer_id, "buyer_id")?;
    validate_id(payload.store_id, "store_id")?;
    validate_id(payload.shipping_address_id, "shipping_address_id")?;

    if payload.items.is_empty() {
        return Err(AppError::Validation("Order must contain at least one item".into()));
    }
    if payload.items.len() > MAX_CART_LINES {
        return Err(AppError::Validation(format!(
            "Order exceeds the maximum of {MAX_CART_LINES} lines"
        )));
    }
    for item in &payload.items {
        validate_id(item.product_id, "product_id")?;
        validate_quantity(item.quantity, "quantity")?;
    }
    if let Some(code) = &payload.coupon_code {
        validate_required_text(code, "coupon_code", MAX_COUPON_CODE_LEN)?;
    }
    Ok(())
}

/// Insert the order under a freshly generated number, retrying on the UNIQUE
/// index when the date+random scheme collides.
async fn insert_with_fresh_number(tx: &mut Tx<'_>, mut new_order: Order) -> AppResult<Order> {
    use crate::db::repository::RepoError;

    for _ in 0..number::MAX_NUMBER_ATTEMPTS {
        new_order.order_number = number::generate(new_order.created_at);
        match order::insert(tx, &new_order).await {
            Ok(()) => return Ok(new_order),
            Err(RepoError::Duplicate(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(AppError::Internal(
        "Could not allocate a unique order number".into(),
    ))
}
