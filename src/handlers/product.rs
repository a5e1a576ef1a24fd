// src/handlers/product.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;
use tracing::instrument;

use crate::dtos::product::{CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::error::{map_fk_violation, map_unique_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

const SELECT: &str = "SELECT p.id, p.name, p.code,
        p.category_id, c.name AS category_name,
        p.brand_id, b.name AS brand_name,
        p.unit_id, u.name AS unit_name,
        p.warehouse_id, w.name AS warehouse_name,
        p.cost, p.price, p.stock, p.alert_quantity, p.description, p.created_at
    FROM products p
    JOIN categories c ON p.category_id = c.id
    LEFT JOIN brands b ON p.brand_id = b.id
    JOIN units u ON p.unit_id = u.id
    LEFT JOIN warehouses w ON p.warehouse_id = w.id";

// GET /products - List products with pagination and search
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<ProductResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["p.name", "p.code"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM products p {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!("{SELECT} {where_sql} ORDER BY p.id DESC LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, ProductResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let products = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(products, total, page, limit)))
}

// GET /products/:id - Get single product with lookup names
pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    fetch_product(&state.db_pool, id).await.map(Json)
}

// POST /products - Create new product
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Product name is required"));
    }
    if payload.code.trim().is_empty() {
        return Err(AppError::validation("Product code is required"));
    }
    if payload.cost < 0.0 || payload.price < 0.0 {
        return Err(AppError::validation("Cost and price cannot be negative"));
    }
    let stock = payload.stock.unwrap_or(0);
    if stock < 0 {
        return Err(AppError::validation("Opening stock cannot be negative"));
    }

    let result = sqlx::query(
        "INSERT INTO products
         (name, code, category_id, brand_id, unit_id, warehouse_id, cost, price, stock, alert_quantity, description)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.code)
    .bind(payload.category_id)
    .bind(payload.brand_id)
    .bind(payload.unit_id)
    .bind(payload.warehouse_id)
    .bind(payload.cost)
    .bind(payload.price)
    .bind(stock)
    .bind(payload.alert_quantity.unwrap_or(0))
    .bind(&payload.description)
    .execute(&state.db_pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::conflict("Product code already exists")
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            AppError::validation("Unknown category, brand, unit, or warehouse")
        }
        other => other.into(),
    })?;

    let product = fetch_product(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /products/:id - Update product (stock is excluded; use adjustments)
#[instrument(skip(state, payload), fields(id))]
pub async fn update_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    if payload.cost.is_some_and(|c| c < 0.0) || payload.price.is_some_and(|p| p < 0.0) {
        return Err(AppError::validation("Cost and price cannot be negative"));
    }

    sqlx::query(
        "UPDATE products SET
         name = COALESCE(?, name),
         code = COALESCE(?, code),
         category_id = COALESCE(?, category_id),
         brand_id = COALESCE(?, brand_id),
         unit_id = COALESCE(?, unit_id),
         warehouse_id = COALESCE(?, warehouse_id),
         cost = COALESCE(?, cost),
         price = COALESCE(?, price),
         alert_quantity = COALESCE(?, alert_quantity),
         description = COALESCE(?, description)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.code)
    .bind(payload.category_id)
    .bind(payload.brand_id)
    .bind(payload.unit_id)
    .bind(payload.warehouse_id)
    .bind(payload.cost)
    .bind(payload.price)
    .bind(payload.alert_quantity)
    .bind(payload.description)
    .bind(id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Product code already exists"))?;

    fetch_product(&state.db_pool, id).await.map(Json)
}

// DELETE /products/:id - Delete product
#[instrument(skip(state), fields(id))]
pub async fn delete_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Product is referenced by existing documents"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    Ok(Json(()))
}

async fn fetch_product(pool: &MySqlPool, id: i64) -> Result<ProductResponse, AppError> {
    sqlx::query_as::<_, ProductResponse>(&format!("{SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))
}
