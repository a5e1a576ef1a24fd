use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveTime};
use sqlx::FromRow;

pub const ATTENDANCE_STATUSES: &[&str] = &["present", "absent", "late", "half_day"];

#[derive(Debug, Deserialize)]
pub struct CreateAttendanceRequest {
    pub employee_id: i64,
    pub attendance_date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct AttendanceResponse {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    pub attendance_date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: String,
}
