use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;

use crate::dtos::department::{CreateDepartmentRequest, DepartmentResponse, UpdateDepartmentRequest};
use crate::error::{map_fk_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

const SELECT: &str = "SELECT d.id, d.name, d.company_id, c.name AS company_name
    FROM departments d
    JOIN companies c ON d.company_id = c.id";

// GET /departments - List departments with their company
pub async fn list_departments(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<DepartmentResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["d.name", "c.name"]));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM departments d JOIN companies c ON d.company_id = c.id {where_sql}"
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!("{SELECT} {where_sql} ORDER BY d.name LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, DepartmentResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let departments = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(departments, total, page, limit)))
}

// GET /departments/:id
pub async fn get_department(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<DepartmentResponse>, AppError> {
    fetch_department(&state.db_pool, id).await.map(Json)
}

// POST /departments
pub async fn create_department(
    State(state): State<AppState>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<DepartmentResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Department name is required"));
    }

    let company: Option<i64> = sqlx::query_scalar("SELECT id FROM companies WHERE id = ?")
        .bind(payload.company_id)
        .fetch_optional(&state.db_pool)
        .await?;
    if company.is_none() {
        return Err(AppError::not_found("Company not found"));
    }

    let result = sqlx::query("INSERT INTO departments (name, company_id) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(payload.company_id)
        .execute(&state.db_pool)
        .await?;

    let department = fetch_department(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

// PUT /departments/:id
pub async fn update_department(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateDepartmentRequest>,
) -> Result<Json<DepartmentResponse>, AppError> {
    if let Some(company_id) = payload.company_id {
        let company: Option<i64> = sqlx::query_scalar("SELECT id FROM companies WHERE id = ?")
            .bind(company_id)
            .fetch_optional(&state.db_pool)
            .await?;
        if company.is_none() {
            return Err(AppError::not_found("Company not found"));
        }
    }

    sqlx::query(
        "UPDATE departments SET
         name = COALESCE(?, name),
         company_id = COALESCE(?, company_id)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.company_id)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_department(&state.db_pool, id).await.map(Json)
}

// DELETE /departments/:id
pub async fn delete_department(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Department has assigned employees"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Department not found"));
    }

    Ok(Json(()))
}

async fn fetch_department(pool: &MySqlPool, id: i64) -> Result<DepartmentResponse, AppError> {
    sqlx::query_as::<_, DepartmentResponse>(&format!("{SELECT} WHERE d.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Department not found"))
}
