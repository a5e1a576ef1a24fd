use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveDate};
use sqlx::FromRow;

pub const LEAVE_STATUSES: &[&str] = &["pending", "approved", "rejected"];

#[derive(Debug, Deserialize)]
pub struct CreateLeaveTypeRequest {
    pub name: String,
    pub max_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeaveTypeRequest {
    pub name: Option<String>,
    pub max_days: Option<i64>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct LeaveTypeResponse {
    pub id: i64,
    pub name: String,
    pub max_days: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateLeaveRequestRequest {
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

/// A leave request is only ever patched through its status workflow.
#[derive(Debug, Deserialize)]
pub struct UpdateLeaveRequestRequest {
    pub status: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct LeaveRequestResponse {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    pub leave_type_id: i64,
    pub leave_type_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
