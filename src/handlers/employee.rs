use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;
use tracing::instrument;

use crate::dtos::employee::{CreateEmployeeRequest, EmployeeResponse, UpdateEmployeeRequest};
use crate::error::{map_fk_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

const SELECT: &str = "SELECT e.id, e.name, e.email, e.phone,
        e.company_id, c.name AS company_name,
        e.department_id, d.name AS department_name,
        e.designation, e.salary, e.hire_date, e.is_active, e.created_at
    FROM employees e
    JOIN companies c ON e.company_id = c.id
    JOIN departments d ON e.department_id = d.id";

// GET /employees - List employees with pagination and search
#[instrument(skip(state))]
pub async fn list_employees(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<EmployeeResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["e.name", "e.email", "e.phone"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM employees e {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!("{SELECT} {where_sql} ORDER BY e.id DESC LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, EmployeeResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone()).bind(t.clone());
    }
    let employees = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(employees, total, page, limit)))
}

// GET /employees/:id
pub async fn get_employee(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<EmployeeResponse>, AppError> {
    fetch_employee(&state.db_pool, id).await.map(Json)
}

// POST /employees
#[instrument(skip(state, payload))]
pub async fn create_employee(
    State(state): State<AppState>,
    Json(payload): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Employee name is required"));
    }
    if payload.salary.is_some_and(|s| s < 0.0) {
        return Err(AppError::validation("Salary cannot be negative"));
    }

    // Department must belong to the given company.
    let department_company: Option<i64> =
        sqlx::query_scalar("SELECT company_id FROM departments WHERE id = ?")
            .bind(payload.department_id)
            .fetch_optional(&state.db_pool)
            .await?;
    match department_company {
        None => return Err(AppError::not_found("Department not found")),
        Some(company_id) if company_id != payload.company_id => {
            return Err(AppError::validation(
                "Department does not belong to the given company",
            ))
        }
        Some(_) => {}
    }

    let result = sqlx::query(
        "INSERT INTO employees
         (name, email, phone, company_id, department_id, designation, salary, hire_date)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.company_id)
    .bind(payload.department_id)
    .bind(&payload.designation)
    .bind(payload.salary.unwrap_or(0.0))
    .bind(payload.hire_date)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_fk_violation(e, "Unknown company or department"))?;

    let employee = fetch_employee(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

// PUT /employees/:id
#[instrument(skip(state, payload), fields(id))]
pub async fn update_employee(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateEmployeeRequest>,
) -> Result<Json<EmployeeResponse>, AppError> {
    if payload.salary.is_some_and(|s| s < 0.0) {
        return Err(AppError::validation("Salary cannot be negative"));
    }

    sqlx::query(
        "UPDATE employees SET
         name = COALESCE(?, name),
         email = COALESCE(?, email),
         phone = COALESCE(?, phone),
         company_id = COALESCE(?, company_id),
         department_id = COALESCE(?, department_id),
         designation = COALESCE(?, designation),
         salary = COALESCE(?, salary),
         hire_date = COALESCE(?, hire_date),
         is_active = COALESCE(?, is_active)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.email)
    .bind(payload.phone)
    .bind(payload.company_id)
    .bind(payload.department_id)
    .bind(payload.designation)
    .bind(payload.salary)
    .bind(payload.hire_date)
    .bind(payload.is_active)
    .bind(id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_fk_violation(e, "Unknown company or department"))?;

    fetch_employee(&state.db_pool, id).await.map(Json)
}

// DELETE /employees/:id - Attendance and leave rows cascade
pub async fn delete_employee(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Employee not found"));
    }

    Ok(Json(()))
}

async fn fetch_employee(pool: &MySqlPool, id: i64) -> Result<EmployeeResponse, AppError> {
    sqlx::query_as::<_, EmployeeResponse>(&format!("{SELECT} WHERE e.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))
}
