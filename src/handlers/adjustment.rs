use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;
use tracing::instrument;

use crate::dtos::adjustment::{
    AdjustmentItemResponse, AdjustmentListItem, AdjustmentResponse, CreateAdjustmentRequest,
};
use crate::error::AppError;
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::reference;
use crate::state::AppState;
use crate::stock;

#[derive(Debug, serde::Deserialize)]
pub struct UpdateAdjustmentRequest {
    pub adjustment_date: Option<chrono::NaiveDate>,
    pub note: Option<String>,
}

// GET /adjustments - List stock adjustments
#[instrument(skip(state))]
pub async fn list_adjustments(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<AdjustmentListItem>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["a.reference", "w.name"]));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM adjustments a JOIN warehouses w ON a.warehouse_id = w.id {where_sql}"
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT a.id, a.reference, w.name AS warehouse_name, a.adjustment_date,
                COUNT(ai.id) AS total_items, a.created_at
         FROM adjustments a
         JOIN warehouses w ON a.warehouse_id = w.id
         LEFT JOIN adjustment_items ai ON ai.adjustment_id = a.id
         {where_sql}
         GROUP BY a.id, a.reference, w.name, a.adjustment_date, a.created_at
         ORDER BY a.adjustment_date DESC, a.id DESC LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, AdjustmentListItem>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let adjustments = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(adjustments, total, page, limit)))
}

// GET /adjustments/:id
pub async fn get_adjustment(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<AdjustmentResponse>, AppError> {
    fetch_adjustment(&state.db_pool, id).await.map(Json)
}

// POST /adjustments - Apply signed stock corrections
#[instrument(skip(state, req))]
pub async fn create_adjustment(
    State(state): State<AppState>,
    Json(req): Json<CreateAdjustmentRequest>,
) -> Result<(StatusCode, Json<AdjustmentResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation(
            "Adjustment must contain at least one item",
        ));
    }
    for item in &req.items {
        if item.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than 0"));
        }
    }

    let mut tx = state.db_pool.begin().await?;

    let warehouse: Option<i64> = sqlx::query_scalar("SELECT id FROM warehouses WHERE id = ?")
        .bind(req.warehouse_id)
        .fetch_optional(&mut *tx)
        .await?;
    if warehouse.is_none() {
        return Err(AppError::not_found("Warehouse not found"));
    }

    let result = sqlx::query(
        "INSERT INTO adjustments (reference, warehouse_id, adjustment_date, note)
         VALUES (?, ?, ?, ?)",
    )
    .bind(reference::generate("ADJ"))
    .bind(req.warehouse_id)
    .bind(req.adjustment_date)
    .bind(&req.note)
    .execute(&mut *tx)
    .await?;
    let adjustment_id = result.last_insert_id() as i64;

    for item in &req.items {
        sqlx::query(
            "INSERT INTO adjustment_items (adjustment_id, product_id, quantity, item_type)
             VALUES (?, ?, ?, ?)",
        )
        .bind(adjustment_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.item_type)
        .execute(&mut *tx)
        .await?;

        stock::apply_stock_change(&mut tx, item.product_id, item.item_type.signed_quantity(item.quantity))
            .await?;
    }

    tx.commit().await?;

    let adjustment = fetch_adjustment(&state.db_pool, adjustment_id).await?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}

// PUT /adjustments/:id - Patch header fields; line items are immutable
pub async fn update_adjustment(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(req): Json<UpdateAdjustmentRequest>,
) -> Result<Json<AdjustmentResponse>, AppError> {
    sqlx::query(
        "UPDATE adjustments SET
         adjustment_date = COALESCE(?, adjustment_date),
         note = COALESCE(?, note)
         WHERE id = ?",
    )
    .bind(req.adjustment_date)
    .bind(req.note)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_adjustment(&state.db_pool, id).await.map(Json)
}

// DELETE /adjustments/:id - Undo each line's stock effect
#[instrument(skip(state), fields(id))]
pub async fn delete_adjustment(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM adjustments WHERE id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Adjustment not found"));
    }

    let items = sqlx::query_as::<_, (i64, i64, String)>(
        "SELECT product_id, quantity, item_type FROM adjustment_items WHERE adjustment_id = ?",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;
    for (product_id, quantity, item_type) in items {
        // Reverse of the original sign.
        let delta = if item_type == "addition" {
            -quantity
        } else {
            quantity
        };
        stock::apply_stock_change(&mut tx, product_id, delta).await?;
    }

    sqlx::query("DELETE FROM adjustments WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Json(()))
}

async fn fetch_adjustment(db_pool: &MySqlPool, id: i64) -> Result<AdjustmentResponse, AppError> {
    let header = sqlx::query_as::<
        _,
        (
            i64,
            String,
            i64,
            String,
            chrono::NaiveDate,
            Option<String>,
            chrono::DateTime<chrono::Utc>,
        ),
    >(
        "SELECT a.id, a.reference, a.warehouse_id, w.name, a.adjustment_date, a.note, a.created_at
         FROM adjustments a
         JOIN warehouses w ON a.warehouse_id = w.id
         WHERE a.id = ?",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Adjustment not found"))?;

    let items = sqlx::query_as::<_, AdjustmentItemResponse>(
        "SELECT ai.id, ai.product_id, p.name AS product_name, p.code AS product_code,
                ai.quantity, ai.item_type
         FROM adjustment_items ai
         JOIN products p ON ai.product_id = p.id
         WHERE ai.adjustment_id = ?
         ORDER BY ai.id",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    Ok(AdjustmentResponse {
        id: header.0,
        reference: header.1,
        warehouse_id: header.2,
        warehouse_name: header.3,
        adjustment_date: header.4,
        note: header.5,
        created_at: header.6,
        items,
    })
}
