use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;

use crate::dtos::category::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
use crate::error::{map_fk_violation, map_unique_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

// GET /categories - List categories
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<CategoryResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["name"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM categories {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT id, name, description FROM categories {where_sql} ORDER BY name LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, CategoryResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone());
    }
    let categories = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(categories, total, page, limit)))
}

// GET /categories/:id
pub async fn get_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CategoryResponse>, AppError> {
    fetch_category(&state.db_pool, id).await.map(Json)
}

// POST /categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Category name is required"));
    }

    let result = sqlx::query("INSERT INTO categories (name, description) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(&payload.description)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_unique_violation(e, "Category name already exists"))?;

    let category = fetch_category(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// PUT /categories/:id
pub async fn update_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    sqlx::query(
        "UPDATE categories SET
         name = COALESCE(?, name),
         description = COALESCE(?, description)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.description)
    .bind(id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Category name already exists"))?;

    fetch_category(&state.db_pool, id).await.map(Json)
}

// DELETE /categories/:id
pub async fn delete_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Category is assigned to existing products"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Category not found"));
    }

    Ok(Json(()))
}

async fn fetch_category(pool: &MySqlPool, id: i64) -> Result<CategoryResponse, AppError> {
    sqlx::query_as::<_, CategoryResponse>("SELECT id, name, description FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))
}
