use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;

use crate::dtos::company::{CompanyResponse, CreateCompanyRequest, UpdateCompanyRequest};
use crate::error::{map_fk_violation, map_unique_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

// GET /companies - List companies
pub async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<CompanyResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["name", "email"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM companies {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT id, name, email, phone, created_at FROM companies {where_sql} ORDER BY name LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, CompanyResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let companies = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(companies, total, page, limit)))
}

// GET /companies/:id
pub async fn get_company(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CompanyResponse>, AppError> {
    fetch_company(&state.db_pool, id).await.map(Json)
}

// POST /companies
pub async fn create_company(
    State(state): State<AppState>,
    Json(payload): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Company name is required"));
    }

    let result = sqlx::query("INSERT INTO companies (name, email, phone) VALUES (?, ?, ?)")
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_unique_violation(e, "Company name already exists"))?;

    let company = fetch_company(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

// PUT /companies/:id
pub async fn update_company(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateCompanyRequest>,
) -> Result<Json<CompanyResponse>, AppError> {
    sqlx::query(
        "UPDATE companies SET
         name = COALESCE(?, name),
         email = COALESCE(?, email),
         phone = COALESCE(?, phone)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.email)
    .bind(payload.phone)
    .bind(id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Company name already exists"))?;

    fetch_company(&state.db_pool, id).await.map(Json)
}

// DELETE /companies/:id
pub async fn delete_company(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM companies WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Company has departments or employees"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Company not found"));
    }

    Ok(Json(()))
}

async fn fetch_company(pool: &MySqlPool, id: i64) -> Result<CompanyResponse, AppError> {
    sqlx::query_as::<_, CompanyResponse>(
        "SELECT id, name, email, phone, created_at FROM companies WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Company not found"))
}
