use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;

use crate::dtos::warehouse::{CreateWarehouseRequest, UpdateWarehouseRequest, WarehouseResponse};
use crate::error::{map_fk_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

const COLUMNS: &str = "id, name, phone, email, address, city, created_at";

// GET /warehouses - List warehouses
pub async fn list_warehouses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<WarehouseResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["name", "city"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM warehouses {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql =
        format!("SELECT {COLUMNS} FROM warehouses {where_sql} ORDER BY name LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, WarehouseResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let warehouses = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(warehouses, total, page, limit)))
}

// GET /warehouses/:id
pub async fn get_warehouse(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<WarehouseResponse>, AppError> {
    fetch_warehouse(&state.db_pool, id).await.map(Json)
}

// POST /warehouses
pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(payload): Json<CreateWarehouseRequest>,
) -> Result<(StatusCode, Json<WarehouseResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Warehouse name is required"));
    }

    let result = sqlx::query(
        "INSERT INTO warehouses (name, phone, email, address, city) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.phone)
    .bind(&payload.email)
    .bind(&payload.address)
    .bind(&payload.city)
    .execute(&state.db_pool)
    .await?;

    let warehouse = fetch_warehouse(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

// PUT /warehouses/:id
pub async fn update_warehouse(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateWarehouseRequest>,
) -> Result<Json<WarehouseResponse>, AppError> {
    sqlx::query(
        "UPDATE warehouses SET
         name = COALESCE(?, name),
         phone = COALESCE(?, phone),
         email = COALESCE(?, email),
         address = COALESCE(?, address),
         city = COALESCE(?, city)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.phone)
    .bind(payload.email)
    .bind(payload.address)
    .bind(payload.city)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_warehouse(&state.db_pool, id).await.map(Json)
}

// DELETE /warehouses/:id
pub async fn delete_warehouse(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM warehouses WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Warehouse is referenced by existing documents"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Warehouse not found"));
    }

    Ok(Json(()))
}

async fn fetch_warehouse(pool: &MySqlPool, id: i64) -> Result<WarehouseResponse, AppError> {
    sqlx::query_as::<_, WarehouseResponse>(&format!(
        "SELECT {COLUMNS} FROM warehouses WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Warehouse not found"))
}
