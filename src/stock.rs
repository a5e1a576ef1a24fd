//! The single write path for `products.stock`.
//!
//! Every document that moves inventory (sales, purchases, returns,
//! adjustments) applies its line items through [`apply_stock_change`] inside
//! the caller's transaction. The row is locked for the read-modify-write and
//! a change that would drive stock negative fails the whole transaction.

use sqlx::{MySql, Transaction};

use crate::error::AppError;

/// Applies a signed stock delta to one product and returns the new level.
///
/// Must run inside the transaction that writes the document's line items so
/// the header, items, and stock move together or not at all.
pub async fn apply_stock_change(
    tx: &mut Transaction<'_, MySql>,
    product_id: i64,
    delta: i64,
) -> Result<i64, AppError> {
    let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ? FOR UPDATE")
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

    let stock =
        stock.ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;

    let new_stock = stock + delta;
    if new_stock < 0 {
        return Err(AppError::validation(format!(
            "Insufficient stock for product {product_id}: available {stock}, requested change {delta}"
        )));
    }

    sqlx::query("UPDATE products SET stock = ? WHERE id = ?")
        .bind(new_stock)
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

    Ok(new_stock)
}

/// Verifies a product holds at least `quantity` units without mutating it.
/// Transfers use this: stock moves between warehouses, the product-level
/// total stays the same.
pub async fn ensure_available(
    tx: &mut Transaction<'_, MySql>,
    product_id: i64,
    quantity: i64,
) -> Result<(), AppError> {
    let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ? FOR UPDATE")
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

    let stock =
        stock.ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;

    if stock < quantity {
        return Err(AppError::validation(format!(
            "Insufficient stock for product {product_id}: available {stock}, requested {quantity}"
        )));
    }

    Ok(())
}
