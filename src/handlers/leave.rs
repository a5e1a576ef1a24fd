use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;

use crate::dtos::leave::{
    CreateLeaveRequestRequest, CreateLeaveTypeRequest, LeaveRequestResponse, LeaveTypeResponse,
    UpdateLeaveRequestRequest, UpdateLeaveTypeRequest, LEAVE_STATUSES,
};
use crate::error::{map_fk_violation, map_unique_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;

const REQUEST_SELECT: &str = "SELECT lr.id, lr.employee_id, e.name AS employee_name,
        lr.leave_type_id, lt.name AS leave_type_name,
        lr.start_date, lr.end_date, lr.reason, lr.status, lr.created_at
    FROM leave_requests lr
    JOIN employees e ON lr.employee_id = e.id
    JOIN leave_types lt ON lr.leave_type_id = lt.id";

// ==================== Leave types ====================

// GET /leave-types
pub async fn list_leave_types(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<LeaveTypeResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["name"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_types {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql =
        format!("SELECT id, name, max_days FROM leave_types {where_sql} ORDER BY name LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, LeaveTypeResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone());
    }
    let types = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(types, total, page, limit)))
}

// GET /leave-types/:id
pub async fn get_leave_type(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<LeaveTypeResponse>, AppError> {
    fetch_leave_type(&state.db_pool, id).await.map(Json)
}

// POST /leave-types
pub async fn create_leave_type(
    State(state): State<AppState>,
    Json(payload): Json<CreateLeaveTypeRequest>,
) -> Result<(StatusCode, Json<LeaveTypeResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Leave type name is required"));
    }
    if payload.max_days.is_some_and(|d| d < 0) {
        return Err(AppError::validation("Max days cannot be negative"));
    }

    let result = sqlx::query("INSERT INTO leave_types (name, max_days) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(payload.max_days.unwrap_or(0))
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_unique_violation(e, "Leave type name already exists"))?;

    let leave_type = fetch_leave_type(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(leave_type)))
}

// PUT /leave-types/:id
pub async fn update_leave_type(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateLeaveTypeRequest>,
) -> Result<Json<LeaveTypeResponse>, AppError> {
    if payload.max_days.is_some_and(|d| d < 0) {
        return Err(AppError::validation("Max days cannot be negative"));
    }

    sqlx::query(
        "UPDATE leave_types SET
         name = COALESCE(?, name),
         max_days = COALESCE(?, max_days)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.max_days)
    .bind(id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Leave type name already exists"))?;

    fetch_leave_type(&state.db_pool, id).await.map(Json)
}

// DELETE /leave-types/:id
pub async fn delete_leave_type(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM leave_types WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Leave type has recorded requests"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Leave type not found"));
    }

    Ok(Json(()))
}

// ==================== Leave requests ====================

#[derive(Debug, serde::Deserialize)]
pub struct LeaveRequestFilter {
    pub employee_id: Option<i64>,
    pub status: Option<String>,
}

// GET /leave-requests - List leave requests; filters by employee and status
pub async fn list_leave_requests(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<LeaveRequestFilter>,
) -> Result<Json<Paginated<LeaveRequestResponse>>, AppError> {
    let (page, limit) = params.normalized();

    let mut where_sql = String::from("WHERE 1=1");
    if filter.employee_id.is_some() {
        where_sql.push_str(" AND lr.employee_id = ?");
    }
    if filter.status.is_some() {
        where_sql.push_str(" AND lr.status = ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests lr {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(employee_id) = filter.employee_id {
        count_query = count_query.bind(employee_id);
    }
    if let Some(status) = &filter.status {
        count_query = count_query.bind(status.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql =
        format!("{REQUEST_SELECT} {where_sql} ORDER BY lr.id DESC LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, LeaveRequestResponse>(&rows_sql);
    if let Some(employee_id) = filter.employee_id {
        rows_query = rows_query.bind(employee_id);
    }
    if let Some(status) = &filter.status {
        rows_query = rows_query.bind(status.clone());
    }
    let requests = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(requests, total, page, limit)))
}

// GET /leave-requests/:id
pub async fn get_leave_request(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<LeaveRequestResponse>, AppError> {
    fetch_leave_request(&state.db_pool, id).await.map(Json)
}

// POST /leave-requests - New requests start out pending
pub async fn create_leave_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateLeaveRequestRequest>,
) -> Result<(StatusCode, Json<LeaveRequestResponse>), AppError> {
    if payload.end_date < payload.start_date {
        return Err(AppError::validation("End date cannot be before start date"));
    }

    let employee: Option<i64> = sqlx::query_scalar("SELECT id FROM employees WHERE id = ?")
        .bind(payload.employee_id)
        .fetch_optional(&state.db_pool)
        .await?;
    if employee.is_none() {
        return Err(AppError::not_found("Employee not found"));
    }
    let leave_type: Option<i64> = sqlx::query_scalar("SELECT id FROM leave_types WHERE id = ?")
        .bind(payload.leave_type_id)
        .fetch_optional(&state.db_pool)
        .await?;
    if leave_type.is_none() {
        return Err(AppError::not_found("Leave type not found"));
    }

    let result = sqlx::query(
        "INSERT INTO leave_requests (employee_id, leave_type_id, start_date, end_date, reason, status)
         VALUES (?, ?, ?, ?, ?, 'pending')",
    )
    .bind(payload.employee_id)
    .bind(payload.leave_type_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(&payload.reason)
    .execute(&state.db_pool)
    .await?;

    let request = fetch_leave_request(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

// PUT /leave-requests/:id - Status workflow: pending -> approved/rejected
pub async fn update_leave_request(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateLeaveRequestRequest>,
) -> Result<Json<LeaveRequestResponse>, AppError> {
    if !LEAVE_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::validation(format!(
            "status must be one of: {}",
            LEAVE_STATUSES.join(", ")
        )));
    }

    sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
        .bind(&payload.status)
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    fetch_leave_request(&state.db_pool, id).await.map(Json)
}

// DELETE /leave-requests/:id
pub async fn delete_leave_request(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM leave_requests WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Leave request not found"));
    }

    Ok(Json(()))
}

async fn fetch_leave_type(pool: &MySqlPool, id: i64) -> Result<LeaveTypeResponse, AppError> {
    sqlx::query_as::<_, LeaveTypeResponse>("SELECT id, name, max_days FROM leave_types WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Leave type not found"))
}

async fn fetch_leave_request(pool: &MySqlPool, id: i64) -> Result<LeaveRequestResponse, AppError> {
    sqlx::query_as::<_, LeaveRequestResponse>(&format!("{REQUEST_SELECT} WHERE lr.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))
}
