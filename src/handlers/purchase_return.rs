use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;
use tracing::instrument;

use crate::dtos::purchase_return::{
    CreatePurchaseReturnRequest, PurchaseReturnItemResponse, PurchaseReturnListItem,
    PurchaseReturnResponse,
};
use crate::error::AppError;
use crate::handlers::sales_return::{price_return_items, PriceSource};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::reference;
use crate::state::AppState;
use crate::stock;

#[derive(Debug, serde::Deserialize)]
pub struct UpdatePurchaseReturnRequest {
    pub return_date: Option<chrono::NaiveDate>,
    pub note: Option<String>,
}

// GET /purchase-returns - List purchase returns
#[instrument(skip(state))]
pub async fn list_purchase_returns(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<PurchaseReturnListItem>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["pr.reference", "sp.name"]));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM purchase_returns pr JOIN suppliers sp ON pr.supplier_id = sp.id {where_sql}"
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT pr.id, pr.reference, sp.name AS supplier_name, w.name AS warehouse_name,
                pr.return_date, pr.total_amount, COUNT(pri.id) AS total_items
         FROM purchase_returns pr
         JOIN suppliers sp ON pr.supplier_id = sp.id
         JOIN warehouses w ON pr.warehouse_id = w.id
         LEFT JOIN purchase_return_items pri ON pri.purchase_return_id = pr.id
         {where_sql}
         GROUP BY pr.id, pr.reference, sp.name, w.name, pr.return_date, pr.total_amount
         ORDER BY pr.return_date DESC, pr.id DESC LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, PurchaseReturnListItem>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let returns = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(returns, total, page, limit)))
}

// GET /purchase-returns/:id
pub async fn get_purchase_return(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<PurchaseReturnResponse>, AppError> {
    fetch_purchase_return(&state.db_pool, id).await.map(Json)
}

// POST /purchase-returns - Goods sent back to the supplier leave stock
#[instrument(skip(state, req))]
pub async fn create_purchase_return(
    State(state): State<AppState>,
    Json(req): Json<CreatePurchaseReturnRequest>,
) -> Result<(StatusCode, Json<PurchaseReturnResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation("Return must contain at least one item"));
    }

    let mut tx = state.db_pool.begin().await?;

    let supplier: Option<i64> = sqlx::query_scalar("SELECT id FROM suppliers WHERE id = ?")
        .bind(req.supplier_id)
        .fetch_optional(&mut *tx)
        .await?;
    if supplier.is_none() {
        return Err(AppError::not_found("Supplier not found"));
    }
    let warehouse: Option<i64> = sqlx::query_scalar("SELECT id FROM warehouses WHERE id = ?")
        .bind(req.warehouse_id)
        .fetch_optional(&mut *tx)
        .await?;
    if warehouse.is_none() {
        return Err(AppError::not_found("Warehouse not found"));
    }
    if let Some(purchase_id) = req.purchase_id {
        let purchase: Option<i64> = sqlx::query_scalar("SELECT id FROM purchases WHERE id = ?")
            .bind(purchase_id)
            .fetch_optional(&mut *tx)
            .await?;
        if purchase.is_none() {
            return Err(AppError::not_found("Purchase not found"));
        }
    }

    let priced = price_return_items(&mut tx, &req.items, PriceSource::Cost).await?;
    let total_amount: f64 = priced.iter().map(|i| i.line_total).sum();

    let result = sqlx::query(
        "INSERT INTO purchase_returns (reference, purchase_id, supplier_id, warehouse_id,
                                       return_date, total_amount, note)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(reference::generate("PR"))
    .bind(req.purchase_id)
    .bind(req.supplier_id)
    .bind(req.warehouse_id)
    .bind(req.return_date)
    .bind(total_amount)
    .bind(&req.note)
    .execute(&mut *tx)
    .await?;
    let return_id = result.last_insert_id() as i64;

    for item in &priced {
        sqlx::query(
            "INSERT INTO purchase_return_items
             (purchase_return_id, product_id, quantity, unit_price, line_total)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(return_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .execute(&mut *tx)
        .await?;

        stock::apply_stock_change(&mut tx, item.product_id, -item.quantity).await?;
    }

    tx.commit().await?;

    let response = fetch_purchase_return(&state.db_pool, return_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// PUT /purchase-returns/:id - Patch header fields; line items are immutable
pub async fn update_purchase_return(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(req): Json<UpdatePurchaseReturnRequest>,
) -> Result<Json<PurchaseReturnResponse>, AppError> {
    sqlx::query(
        "UPDATE purchase_returns SET
         return_date = COALESCE(?, return_date),
         note = COALESCE(?, note)
         WHERE id = ?",
    )
    .bind(req.return_date)
    .bind(req.note)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_purchase_return(&state.db_pool, id).await.map(Json)
}

// DELETE /purchase-returns/:id - Puts the returned goods back into stock
#[instrument(skip(state), fields(id))]
pub async fn delete_purchase_return(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM purchase_returns WHERE id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Purchase return not found"));
    }

    let items = sqlx::query_as::<_, (i64, i64)>(
        "SELECT product_id, quantity FROM purchase_return_items WHERE purchase_return_id = ?",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;
    for (product_id, quantity) in items {
        stock::apply_stock_change(&mut tx, product_id, quantity).await?;
    }

    sqlx::query("DELETE FROM purchase_returns WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Json(()))
}

async fn fetch_purchase_return(
    db_pool: &MySqlPool,
    id: i64,
) -> Result<PurchaseReturnResponse, AppError> {
    let header = sqlx::query_as::<
        _,
        (
            i64,
            String,
            Option<i64>,
            i64,
            String,
            i64,
            String,
            chrono::NaiveDate,
            f64,
            Option<String>,
            chrono::DateTime<chrono::Utc>,
        ),
    >(
        "SELECT pr.id, pr.reference, pr.purchase_id, pr.supplier_id, sp.name,
                pr.warehouse_id, w.name, pr.return_date, pr.total_amount, pr.note, pr.created_at
         FROM purchase_returns pr
         JOIN suppliers sp ON pr.supplier_id = sp.id
         JOIN warehouses w ON pr.warehouse_id = w.id
         WHERE pr.id = ?",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Purchase return not found"))?;

    let items = sqlx::query_as::<_, PurchaseReturnItemResponse>(
        "SELECT pri.id, pri.product_id, p.name AS product_name, p.code AS product_code,
                pri.quantity, pri.unit_price, pri.line_total
         FROM purchase_return_items pri
         JOIN products p ON pri.product_id = p.id
         WHERE pri.purchase_return_id = ?
         ORDER BY pri.id",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    Ok(PurchaseReturnResponse {
        id: header.0,
        reference: header.1,
        purchase_id: header.2,
        supplier_id: header.3,
        supplier_name: header.4,
        warehouse_id: header.5,
        warehouse_name: header.6,
        return_date: header.7,
        total_amount: header.8,
        note: header.9,
        created_at: header.10,
        items,
    })
}
