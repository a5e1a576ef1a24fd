use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;
use tracing::instrument;

use crate::dtos::supplier::{CreateSupplierRequest, SupplierResponse, UpdateSupplierRequest};
use crate::error::{map_fk_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

const COLUMNS: &str = "id, name, email, phone, address, city, country, created_at";

// GET /suppliers - List suppliers with pagination and search
#[instrument(skip(state))]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<SupplierResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["name", "email", "phone"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM suppliers {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql =
        format!("SELECT {COLUMNS} FROM suppliers {where_sql} ORDER BY id DESC LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, SupplierResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone()).bind(t.clone());
    }
    let suppliers = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(suppliers, total, page, limit)))
}

// GET /suppliers/:id - Get single supplier
pub async fn get_supplier(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<SupplierResponse>, AppError> {
    fetch_supplier(&state.db_pool, id).await.map(Json)
}

// POST /suppliers - Create new supplier
#[instrument(skip(state, payload))]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<SupplierResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Supplier name is required"));
    }

    let result = sqlx::query(
        "INSERT INTO suppliers (name, email, phone, address, city, country)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.address)
    .bind(&payload.city)
    .bind(&payload.country)
    .execute(&state.db_pool)
    .await?;

    let supplier = fetch_supplier(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

// PUT /suppliers/:id - Update supplier
#[instrument(skip(state, payload), fields(id))]
pub async fn update_supplier(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> Result<Json<SupplierResponse>, AppError> {
    sqlx::query(
        "UPDATE suppliers SET
         name = COALESCE(?, name),
         email = COALESCE(?, email),
         phone = COALESCE(?, phone),
         address = COALESCE(?, address),
         city = COALESCE(?, city),
         country = COALESCE(?, country)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.email)
    .bind(payload.phone)
    .bind(payload.address)
    .bind(payload.city)
    .bind(payload.country)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_supplier(&state.db_pool, id).await.map(Json)
}

// DELETE /suppliers/:id - Delete supplier
#[instrument(skip(state), fields(id))]
pub async fn delete_supplier(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM suppliers WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Supplier is referenced by existing documents"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Supplier not found"));
    }

    Ok(Json(()))
}

async fn fetch_supplier(pool: &MySqlPool, id: i64) -> Result<SupplierResponse, AppError> {
    sqlx::query_as::<_, SupplierResponse>(&format!(
        "SELECT {COLUMNS} FROM suppliers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Supplier not found"))
}
