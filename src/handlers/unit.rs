use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;

use crate::dtos::unit::{CreateUnitRequest, UnitResponse, UpdateUnitRequest};
use crate::error::{map_fk_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

// GET /units - List units of measure
pub async fn list_units(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<UnitResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["name", "short_name"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM units {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT id, name, short_name FROM units {where_sql} ORDER BY name LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, UnitResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let units = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(units, total, page, limit)))
}

// GET /units/:id
pub async fn get_unit(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<UnitResponse>, AppError> {
    fetch_unit(&state.db_pool, id).await.map(Json)
}

// POST /units
pub async fn create_unit(
    State(state): State<AppState>,
    Json(payload): Json<CreateUnitRequest>,
) -> Result<(StatusCode, Json<UnitResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Unit name is required"));
    }
    if payload.short_name.trim().is_empty() {
        return Err(AppError::validation("Unit short name is required"));
    }

    let result = sqlx::query("INSERT INTO units (name, short_name) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(&payload.short_name)
        .execute(&state.db_pool)
        .await?;

    let unit = fetch_unit(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

// PUT /units/:id
pub async fn update_unit(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateUnitRequest>,
) -> Result<Json<UnitResponse>, AppError> {
    sqlx::query(
        "UPDATE units SET
         name = COALESCE(?, name),
         short_name = COALESCE(?, short_name)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.short_name)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_unit(&state.db_pool, id).await.map(Json)
}

// DELETE /units/:id
pub async fn delete_unit(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM units WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Unit is assigned to existing products"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Unit not found"));
    }

    Ok(Json(()))
}

async fn fetch_unit(pool: &MySqlPool, id: i64) -> Result<UnitResponse, AppError> {
    sqlx::query_as::<_, UnitResponse>("SELECT id, name, short_name FROM units WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Unit not found"))
}
