use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::instrument;

use crate::dtos::sale::{
    payment_status, CreateSaleRequest, SaleItemRequest, SaleItemResponse, SaleListItem,
    SaleResponse, UpdateSaleRequest,
};
use crate::error::AppError;
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::reference;
use crate::state::AppState;
use crate::stock;

// GET /sales - List sales with pagination and search
#[instrument(skip(state))]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<SaleListItem>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["s.reference", "c.name"]));
    }

    let count_sql =
        format!("SELECT COUNT(*) FROM sales s JOIN customers c ON s.customer_id = c.id {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT s.id, s.reference, c.name AS customer_name, w.name AS warehouse_name,
                s.sale_date, s.total_amount, s.paid_amount, s.payment_status,
                COUNT(si.id) AS total_items
         FROM sales s
         JOIN customers c ON s.customer_id = c.id
         JOIN warehouses w ON s.warehouse_id = w.id
         LEFT JOIN sale_items si ON si.sale_id = s.id
         {where_sql}
         GROUP BY s.id, s.reference, c.name, w.name, s.sale_date, s.total_amount,
                  s.paid_amount, s.payment_status
         ORDER BY s.sale_date DESC, s.id DESC LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, SaleListItem>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let sales = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(sales, total, page, limit)))
}

// GET /sales/:id - Get sale with line items
pub async fn get_sale(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<SaleResponse>, AppError> {
    fetch_sale_by_id(&state.db_pool, id).await.map(Json)
}

// POST /sales - Create sale; decrements stock per line item
#[instrument(skip(state, req))]
pub async fn create_sale(
    State(state): State<AppState>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation("Sale must contain at least one item"));
    }
    let paid_amount = req.paid_amount.unwrap_or(0.0);
    if paid_amount < 0.0 {
        return Err(AppError::validation("Paid amount cannot be negative"));
    }

    let mut tx = state.db_pool.begin().await?;

    ensure_customer(&mut tx, req.customer_id).await?;
    ensure_warehouse(&mut tx, req.warehouse_id).await?;

    let priced = price_items(&mut tx, &req.items).await?;
    let total_amount: f64 = priced.iter().map(|i| i.line_total).sum();

    if paid_amount > total_amount {
        return Err(AppError::validation("Paid amount cannot exceed total amount"));
    }

    let result = sqlx::query(
        "INSERT INTO sales (reference, customer_id, warehouse_id, sale_date, total_amount,
                            paid_amount, payment_status, note)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(reference::generate("SL"))
    .bind(req.customer_id)
    .bind(req.warehouse_id)
    .bind(req.sale_date)
    .bind(total_amount)
    .bind(paid_amount)
    .bind(payment_status(total_amount, paid_amount))
    .bind(&req.note)
    .execute(&mut *tx)
    .await?;
    let sale_id = result.last_insert_id() as i64;

    insert_items(&mut tx, sale_id, &priced).await?;

    tx.commit().await?;

    let sale = fetch_sale_by_id(&state.db_pool, sale_id).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

// PUT /sales/:id - Update sale; replaces items and rebalances stock when
// items are provided
#[instrument(skip(state, req), fields(id))]
pub async fn update_sale(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(req): Json<UpdateSaleRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let existing = sqlx::query_as::<_, (f64, f64)>(
        "SELECT total_amount, paid_amount FROM sales WHERE id = ? FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Sale not found"))?;

    if let Some(customer_id) = req.customer_id {
        ensure_customer(&mut tx, customer_id).await?;
    }
    if let Some(warehouse_id) = req.warehouse_id {
        ensure_warehouse(&mut tx, warehouse_id).await?;
    }

    let total_amount = match &req.items {
        Some(items) => {
            if items.is_empty() {
                return Err(AppError::validation("Sale must contain at least one item"));
            }
            // Give back the old items' stock, drop them, then apply the new set.
            let old_items = sqlx::query_as::<_, (i64, i64)>(
                "SELECT product_id, quantity FROM sale_items WHERE sale_id = ?",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
            for (product_id, quantity) in old_items {
                stock::apply_stock_change(&mut tx, product_id, quantity).await?;
            }
            sqlx::query("DELETE FROM sale_items WHERE sale_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            let priced = price_items(&mut tx, items).await?;
            insert_items(&mut tx, id, &priced).await?;
            priced.iter().map(|i| i.line_total).sum()
        }
        None => existing.0,
    };

    let paid_amount = req.paid_amount.unwrap_or(existing.1);
    if paid_amount < 0.0 {
        return Err(AppError::validation("Paid amount cannot be negative"));
    }
    if paid_amount > total_amount {
        return Err(AppError::validation("Paid amount cannot exceed total amount"));
    }

    sqlx::query(
        "UPDATE sales SET
         customer_id = COALESCE(?, customer_id),
         warehouse_id = COALESCE(?, warehouse_id),
         sale_date = COALESCE(?, sale_date),
         note = COALESCE(?, note),
         total_amount = ?,
         paid_amount = ?,
         payment_status = ?
         WHERE id = ?",
    )
    .bind(req.customer_id)
    .bind(req.warehouse_id)
    .bind(req.sale_date)
    .bind(req.note)
    .bind(total_amount)
    .bind(paid_amount)
    .bind(payment_status(total_amount, paid_amount))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    fetch_sale_by_id(&state.db_pool, id).await.map(Json)
}

// DELETE /sales/:id - Delete sale and restore the stock it consumed
#[instrument(skip(state), fields(id))]
pub async fn delete_sale(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM sales WHERE id = ? FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Sale not found"));
    }

    let items = sqlx::query_as::<_, (i64, i64)>(
        "SELECT product_id, quantity FROM sale_items WHERE sale_id = ?",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;
    for (product_id, quantity) in items {
        stock::apply_stock_change(&mut tx, product_id, quantity).await?;
    }

    // Line items go with the header via ON DELETE CASCADE.
    sqlx::query("DELETE FROM sales WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Json(()))
}

struct PricedItem {
    product_id: i64,
    quantity: i64,
    unit_price: f64,
    line_total: f64,
}

/// Resolves unit prices (falling back to the product's selling price) and
/// validates quantities. Runs inside the caller's transaction.
async fn price_items(
    tx: &mut Transaction<'_, MySql>,
    items: &[SaleItemRequest],
) -> Result<Vec<PricedItem>, AppError> {
    let mut priced = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than 0"));
        }
        let price: Option<f64> = sqlx::query_scalar("SELECT price FROM products WHERE id = ?")
            .bind(item.product_id)
            .fetch_optional(&mut **tx)
            .await?;
        let price = price
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", item.product_id)))?;

        let unit_price = item.unit_price.unwrap_or(price);
        if unit_price < 0.0 {
            return Err(AppError::validation("Unit price cannot be negative"));
        }

        priced.push(PricedItem {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price,
            line_total: item.quantity as f64 * unit_price,
        });
    }
    Ok(priced)
}

async fn insert_items(
    tx: &mut Transaction<'_, MySql>,
    sale_id: i64,
    items: &[PricedItem],
) -> Result<(), AppError> {
    for item in items {
        sqlx::query(
            "INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, line_total)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(sale_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .execute(&mut **tx)
        .await?;

        stock::apply_stock_change(tx, item.product_id, -item.quantity).await?;
    }
    Ok(())
}

async fn ensure_customer(tx: &mut Transaction<'_, MySql>, id: i64) -> Result<(), AppError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    exists
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Customer not found"))
}

async fn ensure_warehouse(tx: &mut Transaction<'_, MySql>, id: i64) -> Result<(), AppError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM warehouses WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    exists
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Warehouse not found"))
}

// Helper to fetch full sale details
async fn fetch_sale_by_id(db_pool: &MySqlPool, id: i64) -> Result<SaleResponse, AppError> {
    let header = sqlx::query_as::<
        _,
        (
            i64,
            String,
            i64,
            String,
            i64,
            String,
            chrono::NaiveDate,
            f64,
            f64,
            String,
            Option<String>,
            chrono::DateTime<chrono::Utc>,
        ),
    >(
        "SELECT s.id, s.reference, s.customer_id, c.name, s.warehouse_id, w.name,
                s.sale_date, s.total_amount, s.paid_amount, s.payment_status, s.note, s.created_at
         FROM sales s
         JOIN customers c ON s.customer_id = c.id
         JOIN warehouses w ON s.warehouse_id = w.id
         WHERE s.id = ?",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Sale not found"))?;

    let items = sqlx::query_as::<_, SaleItemResponse>(
        "SELECT si.id, si.product_id, p.name AS product_name, p.code AS product_code,
                si.quantity, si.unit_price, si.line_total
         FROM sale_items si
         JOIN products p ON si.product_id = p.id
         WHERE si.sale_id = ?
         ORDER BY si.id",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    Ok(SaleResponse {
        id: header.0,
        reference: header.1,
        customer_id: header.2,
        customer_name: header.3,
        warehouse_id: header.4,
        warehouse_name: header.5,
        sale_date: header.6,
        total_amount: header.7,
        paid_amount: header.8,
        payment_status: header.9,
        note: header.10,
        created_at: header.11,
        items,
    })
}
