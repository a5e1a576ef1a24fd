use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::instrument;

use crate::dtos::purchase::{
    CreatePurchaseRequest, PurchaseItemRequest, PurchaseItemResponse, PurchaseListItem,
    PurchaseResponse, UpdatePurchaseRequest,
};
use crate::dtos::sale::payment_status;
use crate::error::AppError;
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::reference;
use crate::state::AppState;
use crate::stock;

// GET /purchases - List purchases with pagination and search
#[instrument(skip(state))]
pub async fn list_purchases(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<PurchaseListItem>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["p.reference", "sp.name"]));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM purchases p JOIN suppliers sp ON p.supplier_id = sp.id {where_sql}"
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT p.id, p.reference, sp.name AS supplier_name, w.name AS warehouse_name,
                p.purchase_date, p.total_amount, p.paid_amount, p.payment_status,
                COUNT(pi.id) AS total_items
         FROM purchases p
         JOIN suppliers sp ON p.supplier_id = sp.id
         JOIN warehouses w ON p.warehouse_id = w.id
         LEFT JOIN purchase_items pi ON pi.purchase_id = p.id
         {where_sql}
         GROUP BY p.id, p.reference, sp.name, w.name, p.purchase_date, p.total_amount,
                  p.paid_amount, p.payment_status
         ORDER BY p.purchase_date DESC, p.id DESC LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, PurchaseListItem>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let purchases = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(purchases, total, page, limit)))
}

// GET /purchases/:id - Get purchase with line items
pub async fn get_purchase(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<PurchaseResponse>, AppError> {
    fetch_purchase_by_id(&state.db_pool, id).await.map(Json)
}

// POST /purchases - Create purchase; increments stock per line item
#[instrument(skip(state, req))]
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(req): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation(
            "Purchase must contain at least one item",
        ));
    }
    let paid_amount = req.paid_amount.unwrap_or(0.0);
    if paid_amount < 0.0 {
        return Err(AppError::validation("Paid amount cannot be negative"));
    }

    let mut tx = state.db_pool.begin().await?;

    ensure_supplier(&mut tx, req.supplier_id).await?;
    ensure_warehouse(&mut tx, req.warehouse_id).await?;

    let priced = price_items(&mut tx, &req.items).await?;
    let total_amount: f64 = priced.iter().map(|i| i.line_total).sum();

    if paid_amount > total_amount {
        return Err(AppError::validation("Paid amount cannot exceed total amount"));
    }

    let result = sqlx::query(
        "INSERT INTO purchases (reference, supplier_id, warehouse_id, purchase_date,
                                total_amount, paid_amount, payment_status, note)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(reference::generate("PO"))
    .bind(req.supplier_id)
    .bind(req.warehouse_id)
    .bind(req.purchase_date)
    .bind(total_amount)
    .bind(paid_amount)
    .bind(payment_status(total_amount, paid_amount))
    .bind(&req.note)
    .execute(&mut *tx)
    .await?;
    let purchase_id = result.last_insert_id() as i64;

    insert_items(&mut tx, purchase_id, &priced).await?;

    tx.commit().await?;

    let purchase = fetch_purchase_by_id(&state.db_pool, purchase_id).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

// PUT /purchases/:id - Update purchase; replaces items and rebalances stock
// when items are provided
#[instrument(skip(state, req), fields(id))]
pub async fn update_purchase(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(req): Json<UpdatePurchaseRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let existing = sqlx::query_as::<_, (f64, f64)>(
        "SELECT total_amount, paid_amount FROM purchases WHERE id = ? FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Purchase not found"))?;

    if let Some(supplier_id) = req.supplier_id {
        ensure_supplier(&mut tx, supplier_id).await?;
    }
    if let Some(warehouse_id) = req.warehouse_id {
        ensure_warehouse(&mut tx, warehouse_id).await?;
    }

    let total_amount = match &req.items {
        Some(items) => {
            if items.is_empty() {
                return Err(AppError::validation(
                    "Purchase must contain at least one item",
                ));
            }
            // Received stock is taken back before the old items are dropped;
            // fails if some of it was already sold on.
            let old_items = sqlx::query_as::<_, (i64, i64)>(
                "SELECT product_id, quantity FROM purchase_items WHERE purchase_id = ?",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
            for (product_id, quantity) in old_items {
                stock::apply_stock_change(&mut tx, product_id, -quantity).await?;
            }
            sqlx::query("DELETE FROM purchase_items WHERE purchase_id = ?")
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
        "UPDATE purchases SET
         supplier_id = COALESCE(?, supplier_id),
         warehouse_id = COALESCE(?, warehouse_id),
         purchase_date = COALESCE(?, purchase_date),
         note = COALESCE(?, note),
         total_amount = ?,
         paid_amount = ?,
         payment_status = ?
         WHERE id = ?",
    )
    .bind(req.supplier_id)
    .bind(req.warehouse_id)
    .bind(req.purchase_date)
    .bind(req.note)
    .bind(total_amount)
    .bind(paid_amount)
    .bind(payment_status(total_amount, paid_amount))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    fetch_purchase_by_id(&state.db_pool, id).await.map(Json)
}

// DELETE /purchases/:id - Delete purchase and take back the stock it added
#[instrument(skip(state), fields(id))]
pub async fn delete_purchase(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM purchases WHERE id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Purchase not found"));
    }

    let items = sqlx::query_as::<_, (i64, i64)>(
        "SELECT product_id, quantity FROM purchase_items WHERE purchase_id = ?",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;
    for (product_id, quantity) in items {
        stock::apply_stock_change(&mut tx, product_id, -quantity).await?;
    }

    sqlx::query("DELETE FROM purchases WHERE id = ?")
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

/// Resolves unit prices (falling back to the product's cost) and validates
/// quantities. Runs inside the caller's transaction.
async fn price_items(
    tx: &mut Transaction<'_, MySql>,
    items: &[PurchaseItemRequest],
) -> Result<Vec<PricedItem>, AppError> {
    let mut priced = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than 0"));
        }
        let cost: Option<f64> = sqlx::query_scalar("SELECT cost FROM products WHERE id = ?")
            .bind(item.product_id)
            .fetch_optional(&mut **tx)
            .await?;
        let cost = cost
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", item.product_id)))?;

        let unit_price = item.unit_price.unwrap_or(cost);
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
    purchase_id: i64,
    items: &[PricedItem],
) -> Result<(), AppError> {
    for item in items {
        sqlx::query(
            "INSERT INTO purchase_items (purchase_id, product_id, quantity, unit_price, line_total)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(purchase_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .execute(&mut **tx)
        .await?;

        stock::apply_stock_change(tx, item.product_id, item.quantity).await?;
    }
    Ok(())
}

async fn ensure_supplier(tx: &mut Transaction<'_, MySql>, id: i64) -> Result<(), AppError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM suppliers WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    exists
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Supplier not found"))
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

// Helper to fetch full purchase details
async fn fetch_purchase_by_id(db_pool: &MySqlPool, id: i64) -> Result<PurchaseResponse, AppError> {
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
        "SELECT p.id, p.reference, p.supplier_id, sp.name, p.warehouse_id, w.name,
                p.purchase_date, p.total_amount, p.paid_amount, p.payment_status, p.note, p.created_at
         FROM purchases p
         JOIN suppliers sp ON p.supplier_id = sp.id
         JOIN warehouses w ON p.warehouse_id = w.id
         WHERE p.id = ?",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Purchase not found"))?;

    let items = sqlx::query_as::<_, PurchaseItemResponse>(
        "SELECT pi.id, pi.product_id, p.name AS product_name, p.code AS product_code,
                pi.quantity, pi.unit_price, pi.line_total
         FROM purchase_items pi
         JOIN products p ON pi.product_id = p.id
         WHERE pi.purchase_id = ?
         ORDER BY pi.id",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    Ok(PurchaseResponse {
        id: header.0,
        reference: header.1,
        supplier_id: header.2,
        supplier_name: header.3,
        warehouse_id: header.4,
        warehouse_name: header.5,
        purchase_date: header.6,
        total_amount: header.7,
        paid_amount: header.8,
        payment_status: header.9,
        note: header.10,
        created_at: header.11,
        items,
    })
}
