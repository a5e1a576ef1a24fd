use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;
use tracing::instrument;

use crate::dtos::customer::{CreateCustomerRequest, CustomerResponse, UpdateCustomerRequest};
use crate::error::{map_fk_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

const COLUMNS: &str = "id, name, email, phone, address, city, country, created_at";

// GET /customers - List customers with pagination and search
#[instrument(skip(state))]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<CustomerResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["name", "email", "phone"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM customers {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql =
        format!("SELECT {COLUMNS} FROM customers {where_sql} ORDER BY id DESC LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, CustomerResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone()).bind(t.clone());
    }
    let customers = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(customers, total, page, limit)))
}

// GET /customers/:id - Get single customer
pub async fn get_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CustomerResponse>, AppError> {
    fetch_customer(&state.db_pool, id).await.map(Json)
}

// POST /customers - Create new customer
#[instrument(skip(state, payload))]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Customer name is required"));
    }

    let result = sqlx::query(
        "INSERT INTO customers (name, email, phone, address, city, country)
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

    let customer = fetch_customer(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /customers/:id - Update customer
#[instrument(skip(state, payload), fields(id))]
pub async fn update_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    sqlx::query(
        "UPDATE customers SET
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

    fetch_customer(&state.db_pool, id).await.map(Json)
}

// DELETE /customers/:id - Delete customer
#[instrument(skip(state), fields(id))]
pub async fn delete_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM customers WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Customer is referenced by existing documents"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Customer not found"));
    }

    Ok(Json(()))
}

async fn fetch_customer(pool: &MySqlPool, id: i64) -> Result<CustomerResponse, AppError> {
    sqlx::query_as::<_, CustomerResponse>(&format!(
        "SELECT {COLUMNS} FROM customers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))
}
