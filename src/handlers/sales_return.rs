use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::instrument;

use crate::dtos::sales_return::{
    CreateSalesReturnRequest, ReturnItemRequest, ReturnItemResponse, SalesReturnListItem,
    SalesReturnResponse,
};
use crate::error::AppError;
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::reference;
use crate::state::AppState;
use crate::stock;

#[derive(Debug, serde::Deserialize)]
pub struct UpdateSalesReturnRequest {
    pub return_date: Option<chrono::NaiveDate>,
    pub note: Option<String>,
}

// GET /sales-returns - List sales returns
#[instrument(skip(state))]
pub async fn list_sales_returns(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<SalesReturnListItem>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["sr.reference", "c.name"]));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM sales_returns sr JOIN customers c ON sr.customer_id = c.id {where_sql}"
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT sr.id, sr.reference, c.name AS customer_name, w.name AS warehouse_name,
                sr.return_date, sr.total_amount, COUNT(sri.id) AS total_items
         FROM sales_returns sr
         JOIN customers c ON sr.customer_id = c.id
         JOIN warehouses w ON sr.warehouse_id = w.id
         LEFT JOIN sales_return_items sri ON sri.sales_return_id = sr.id
         {where_sql}
         GROUP BY sr.id, sr.reference, c.name, w.name, sr.return_date, sr.total_amount
         ORDER BY sr.return_date DESC, sr.id DESC LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, SalesReturnListItem>(&rows_sql);
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

// GET /sales-returns/:id
pub async fn get_sales_return(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<SalesReturnResponse>, AppError> {
    fetch_sales_return(&state.db_pool, id).await.map(Json)
}

// POST /sales-returns - Returned goods go back into stock
#[instrument(skip(state, req))]
pub async fn create_sales_return(
    State(state): State<AppState>,
    Json(req): Json<CreateSalesReturnRequest>,
) -> Result<(StatusCode, Json<SalesReturnResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation("Return must contain at least one item"));
    }

    let mut tx = state.db_pool.begin().await?;

    let customer: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?")
        .bind(req.customer_id)
        .fetch_optional(&mut *tx)
        .await?;
    if customer.is_none() {
        return Err(AppError::not_found("Customer not found"));
    }
    let warehouse: Option<i64> = sqlx::query_scalar("SELECT id FROM warehouses WHERE id = ?")
        .bind(req.warehouse_id)
        .fetch_optional(&mut *tx)
        .await?;
    if warehouse.is_none() {
        return Err(AppError::not_found("Warehouse not found"));
    }
    if let Some(sale_id) = req.sale_id {
        let sale: Option<i64> = sqlx::query_scalar("SELECT id FROM sales WHERE id = ?")
            .bind(sale_id)
            .fetch_optional(&mut *tx)
            .await?;
        if sale.is_none() {
            return Err(AppError::not_found("Sale not found"));
        }
    }

    let priced = price_return_items(&mut tx, &req.items, PriceSource::SellingPrice).await?;
    let total_amount: f64 = priced.iter().map(|i| i.line_total).sum();

    let result = sqlx::query(
        "INSERT INTO sales_returns (reference, sale_id, customer_id, warehouse_id,
                                    return_date, total_amount, note)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(reference::generate("SR"))
    .bind(req.sale_id)
    .bind(req.customer_id)
    .bind(req.warehouse_id)
    .bind(req.return_date)
    .bind(total_amount)
    .bind(&req.note)
    .execute(&mut *tx)
    .await?;
    let return_id = result.last_insert_id() as i64;

    for item in &priced {
        sqlx::query(
            "INSERT INTO sales_return_items
             (sales_return_id, product_id, quantity, unit_price, line_total)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(return_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .execute(&mut *tx)
        .await?;

        stock::apply_stock_change(&mut tx, item.product_id, item.quantity).await?;
    }

    tx.commit().await?;

    let response = fetch_sales_return(&state.db_pool, return_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// PUT /sales-returns/:id - Patch header fields; line items are immutable
pub async fn update_sales_return(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(req): Json<UpdateSalesReturnRequest>,
) -> Result<Json<SalesReturnResponse>, AppError> {
    sqlx::query(
        "UPDATE sales_returns SET
         return_date = COALESCE(?, return_date),
         note = COALESCE(?, note)
         WHERE id = ?",
    )
    .bind(req.return_date)
    .bind(req.note)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_sales_return(&state.db_pool, id).await.map(Json)
}

// DELETE /sales-returns/:id - Reverses the restock (validated non-negative)
#[instrument(skip(state), fields(id))]
pub async fn delete_sales_return(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM sales_returns WHERE id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Sales return not found"));
    }

    let items = sqlx::query_as::<_, (i64, i64)>(
        "SELECT product_id, quantity FROM sales_return_items WHERE sales_return_id = ?",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;
    for (product_id, quantity) in items {
        stock::apply_stock_change(&mut tx, product_id, -quantity).await?;
    }

    sqlx::query("DELETE FROM sales_returns WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Json(()))
}

pub(crate) enum PriceSource {
    SellingPrice,
    Cost,
}

pub(crate) struct PricedReturnItem {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Shared by both return flows; the fallback price column differs.
pub(crate) async fn price_return_items(
    tx: &mut Transaction<'_, MySql>,
    items: &[ReturnItemRequest],
    source: PriceSource,
) -> Result<Vec<PricedReturnItem>, AppError> {
    let column = match source {
        PriceSource::SellingPrice => "price",
        PriceSource::Cost => "cost",
    };
    let sql = format!("SELECT {column} FROM products WHERE id = ?");

    let mut priced = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than 0"));
        }
        let fallback: Option<f64> = sqlx::query_scalar(&sql)
            .bind(item.product_id)
            .fetch_optional(&mut **tx)
            .await?;
        let fallback = fallback
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", item.product_id)))?;

        let unit_price = item.unit_price.unwrap_or(fallback);
        if unit_price < 0.0 {
            return Err(AppError::validation("Unit price cannot be negative"));
        }

        priced.push(PricedReturnItem {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price,
            line_total: item.quantity as f64 * unit_price,
        });
    }
    Ok(priced)
}

async fn fetch_sales_return(db_pool: &MySqlPool, id: i64) -> Result<SalesReturnResponse, AppError> {
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
        "SELECT sr.id, sr.reference, sr.sale_id, sr.customer_id, c.name,
                sr.warehouse_id, w.name, sr.return_date, sr.total_amount, sr.note, sr.created_at
         FROM sales_returns sr
         JOIN customers c ON sr.customer_id = c.id
         JOIN warehouses w ON sr.warehouse_id = w.id
         WHERE sr.id = ?",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Sales return not found"))?;

    let items = sqlx::query_as::<_, ReturnItemResponse>(
        "SELECT sri.id, sri.product_id, p.name AS product_name, p.code AS product_code,
                sri.quantity, sri.unit_price, sri.line_total
         FROM sales_return_items sri
         JOIN products p ON sri.product_id = p.id
         WHERE sri.sales_return_id = ?
         ORDER BY sri.id",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    Ok(SalesReturnResponse {
        id: header.0,
        reference: header.1,
        sale_id: header.2,
        customer_id: header.3,
        customer_name: header.4,
        warehouse_id: header.5,
        warehouse_name: header.6,
        return_date: header.7,
        total_amount: header.8,
        note: header.9,
        created_at: header.10,
        items,
    })
}
