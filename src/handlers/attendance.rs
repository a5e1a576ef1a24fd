use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;

use crate::dtos::attendance::{
    AttendanceResponse, CreateAttendanceRequest, UpdateAttendanceRequest, ATTENDANCE_STATUSES,
};
use crate::error::{map_unique_violation, AppError};
use crate::pagination::{ListParams, Paginated};
use crate::state::AppState;

const SELECT: &str = "SELECT a.id, a.employee_id, e.name AS employee_name,
        a.attendance_date, a.check_in, a.check_out, a.status
    FROM attendances a
    JOIN employees e ON a.employee_id = e.id";

#[derive(Debug, serde::Deserialize)]
pub struct AttendanceFilter {
    pub employee_id: Option<i64>,
    pub date: Option<chrono::NaiveDate>,
}

// GET /attendances - List attendance records; filters by employee and date
pub async fn list_attendances(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<AttendanceFilter>,
) -> Result<Json<Paginated<AttendanceResponse>>, AppError> {
    let (page, limit) = params.normalized();

    let mut where_sql = String::from("WHERE 1=1");
    if filter.employee_id.is_some() {
        where_sql.push_str(" AND a.employee_id = ?");
    }
    if filter.date.is_some() {
        where_sql.push_str(" AND a.attendance_date = ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM attendances a {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(employee_id) = filter.employee_id {
        count_query = count_query.bind(employee_id);
    }
    if let Some(date) = filter.date {
        count_query = count_query.bind(date);
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql =
        format!("{SELECT} {where_sql} ORDER BY a.attendance_date DESC, a.id DESC LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, AttendanceResponse>(&rows_sql);
    if let Some(employee_id) = filter.employee_id {
        rows_query = rows_query.bind(employee_id);
    }
    if let Some(date) = filter.date {
        rows_query = rows_query.bind(date);
    }
    let attendances = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(attendances, total, page, limit)))
}

// GET /attendances/:id
pub async fn get_attendance(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<AttendanceResponse>, AppError> {
    fetch_attendance(&state.db_pool, id).await.map(Json)
}

// POST /attendances - One record per employee per day
pub async fn create_attendance(
    State(state): State<AppState>,
    Json(payload): Json<CreateAttendanceRequest>,
) -> Result<(StatusCode, Json<AttendanceResponse>), AppError> {
    let status = payload.status.as_deref().unwrap_or("present");
    if !ATTENDANCE_STATUSES.contains(&status) {
        return Err(AppError::validation(format!(
            "status must be one of: {}",
            ATTENDANCE_STATUSES.join(", ")
        )));
    }

    let employee: Option<i64> = sqlx::query_scalar("SELECT id FROM employees WHERE id = ?")
        .bind(payload.employee_id)
        .fetch_optional(&state.db_pool)
        .await?;
    if employee.is_none() {
        return Err(AppError::not_found("Employee not found"));
    }

    let result = sqlx::query(
        "INSERT INTO attendances (employee_id, attendance_date, check_in, check_out, status)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(payload.employee_id)
    .bind(payload.attendance_date)
    .bind(payload.check_in)
    .bind(payload.check_out)
    .bind(status)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Attendance already recorded for this employee and date"))?;

    let attendance = fetch_attendance(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(attendance)))
}

// PUT /attendances/:id
pub async fn update_attendance(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateAttendanceRequest>,
) -> Result<Json<AttendanceResponse>, AppError> {
    if let Some(status) = payload.status.as_deref() {
        if !ATTENDANCE_STATUSES.contains(&status) {
            return Err(AppError::validation(format!(
                "status must be one of: {}",
                ATTENDANCE_STATUSES.join(", ")
            )));
        }
    }

    sqlx::query(
        "UPDATE attendances SET
         check_in = COALESCE(?, check_in),
         check_out = COALESCE(?, check_out),
         status = COALESCE(?, status)
         WHERE id = ?",
    )
    .bind(payload.check_in)
    .bind(payload.check_out)
    .bind(payload.status)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_attendance(&state.db_pool, id).await.map(Json)
}

// DELETE /attendances/:id
pub async fn delete_attendance(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM attendances WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Attendance record not found"));
    }

    Ok(Json(()))
}

async fn fetch_attendance(pool: &MySqlPool, id: i64) -> Result<AttendanceResponse, AppError> {
    sqlx::query_as::<_, AttendanceResponse>(&format!("{SELECT} WHERE a.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Attendance record not found"))
}
