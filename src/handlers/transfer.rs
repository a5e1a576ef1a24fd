use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;
use tracing::instrument;

use crate::dtos::transfer::{
    CreateTransferRequest, TransferItemResponse, TransferListItem, TransferResponse,
};
use crate::error::AppError;
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::reference;
use crate::state::AppState;
use crate::stock;

#[derive(Debug, serde::Deserialize)]
pub struct UpdateTransferRequest {
    pub transfer_date: Option<chrono::NaiveDate>,
    pub note: Option<String>,
}

// GET /transfers - List warehouse transfers
#[instrument(skip(state))]
pub async fn list_transfers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<TransferListItem>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["t.reference", "wf.name", "wt.name"]));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM transfers t
         JOIN warehouses wf ON t.from_warehouse_id = wf.id
         JOIN warehouses wt ON t.to_warehouse_id = wt.id
         {where_sql}"
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT t.id, t.reference, wf.name AS from_warehouse_name, wt.name AS to_warehouse_name,
                t.transfer_date, COUNT(ti.id) AS total_items
         FROM transfers t
         JOIN warehouses wf ON t.from_warehouse_id = wf.id
         JOIN warehouses wt ON t.to_warehouse_id = wt.id
         LEFT JOIN transfer_items ti ON ti.transfer_id = t.id
         {where_sql}
         GROUP BY t.id, t.reference, wf.name, wt.name, t.transfer_date
         ORDER BY t.transfer_date DESC, t.id DESC LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, TransferListItem>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone()).bind(t.clone());
    }
    let transfers = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(transfers, total, page, limit)))
}

// GET /transfers/:id
pub async fn get_transfer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<TransferResponse>, AppError> {
    fetch_transfer(&state.db_pool, id).await.map(Json)
}

// POST /transfers - Record stock movement between warehouses.
// Product-level stock is unchanged (the column is global), but each line is
// validated against availability.
#[instrument(skip(state, req))]
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(req): Json<CreateTransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation(
            "Transfer must contain at least one item",
        ));
    }
    if req.from_warehouse_id == req.to_warehouse_id {
        return Err(AppError::validation(
            "Source and destination warehouses must differ",
        ));
    }

    let mut tx = state.db_pool.begin().await?;

    for warehouse_id in [req.from_warehouse_id, req.to_warehouse_id] {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM warehouses WHERE id = ?")
            .bind(warehouse_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::not_found(format!(
                "Warehouse {warehouse_id} not found"
            )));
        }
    }

    for item in &req.items {
        if item.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than 0"));
        }
        stock::ensure_available(&mut tx, item.product_id, item.quantity).await?;
    }

    let result = sqlx::query(
        "INSERT INTO transfers (reference, from_warehouse_id, to_warehouse_id, transfer_date, note)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(reference::generate("TRF"))
    .bind(req.from_warehouse_id)
    .bind(req.to_warehouse_id)
    .bind(req.transfer_date)
    .bind(&req.note)
    .execute(&mut *tx)
    .await?;
    let transfer_id = result.last_insert_id() as i64;

    for item in &req.items {
        sqlx::query(
            "INSERT INTO transfer_items (transfer_id, product_id, quantity) VALUES (?, ?, ?)",
        )
        .bind(transfer_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let transfer = fetch_transfer(&state.db_pool, transfer_id).await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

// PUT /transfers/:id - Patch header fields; line items are immutable
pub async fn update_transfer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(req): Json<UpdateTransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    sqlx::query(
        "UPDATE transfers SET
         transfer_date = COALESCE(?, transfer_date),
         note = COALESCE(?, note)
         WHERE id = ?",
    )
    .bind(req.transfer_date)
    .bind(req.note)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_transfer(&state.db_pool, id).await.map(Json)
}

// DELETE /transfers/:id - No stock effect to reverse
#[instrument(skip(state), fields(id))]
pub async fn delete_transfer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM transfers WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Transfer not found"));
    }

    Ok(Json(()))
}

async fn fetch_transfer(db_pool: &MySqlPool, id: i64) -> Result<TransferResponse, AppError> {
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
            Option<String>,
            chrono::DateTime<chrono::Utc>,
        ),
    >(
        "SELECT t.id, t.reference, t.from_warehouse_id, wf.name, t.to_warehouse_id, wt.name,
                t.transfer_date, t.note, t.created_at
         FROM transfers t
         JOIN warehouses wf ON t.from_warehouse_id = wf.id
         JOIN warehouses wt ON t.to_warehouse_id = wt.id
         WHERE t.id = ?",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Transfer not found"))?;

    let items = sqlx::query_as::<_, TransferItemResponse>(
        "SELECT ti.id, ti.product_id, p.name AS product_name, p.code AS product_code, ti.quantity
         FROM transfer_items ti
         JOIN products p ON ti.product_id = p.id
         WHERE ti.transfer_id = ?
         ORDER BY ti.id",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    Ok(TransferResponse {
        id: header.0,
        reference: header.1,
        from_warehouse_id: header.2,
        from_warehouse_name: header.3,
        to_warehouse_id: header.4,
        to_warehouse_name: header.5,
        transfer_date: header.6,
        note: header.7,
        created_at: header.8,
        items,
    })
}
