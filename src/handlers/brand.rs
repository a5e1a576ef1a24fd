use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;

use crate::dtos::brand::{BrandResponse, CreateBrandRequest, UpdateBrandRequest};
use crate::error::{map_fk_violation, map_unique_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

// GET /brands - List brands
pub async fn list_brands(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<BrandResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["name"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM brands {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT id, name, description FROM brands {where_sql} ORDER BY name LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, BrandResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone());
    }
    let brands = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(brands, total, page, limit)))
}

// GET /brands/:id
pub async fn get_brand(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<BrandResponse>, AppError> {
    fetch_brand(&state.db_pool, id).await.map(Json)
}

// POST /brands
pub async fn create_brand(
    State(state): State<AppState>,
    Json(payload): Json<CreateBrandRequest>,
) -> Result<(StatusCode, Json<BrandResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Brand name is required"));
    }

    let result = sqlx::query("INSERT INTO brands (name, description) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(&payload.description)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_unique_violation(e, "Brand name already exists"))?;

    let brand = fetch_brand(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

// PUT /brands/:id
pub async fn update_brand(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateBrandRequest>,
) -> Result<Json<BrandResponse>, AppError> {
    sqlx::query(
        "UPDATE brands SET
         name = COALESCE(?, name),
         description = COALESCE(?, description)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.description)
    .bind(id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Brand name already exists"))?;

    fetch_brand(&state.db_pool, id).await.map(Json)
}

// DELETE /brands/:id
pub async fn delete_brand(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM brands WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Brand is assigned to existing products"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Brand not found"));
    }

    Ok(Json(()))
}

async fn fetch_brand(pool: &MySqlPool, id: i64) -> Result<BrandResponse, AppError> {
    sqlx::query_as::<_, BrandResponse>("SELECT id, name, description FROM brands WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Brand not found"))
}
