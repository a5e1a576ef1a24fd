use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveDate};
use sqlx::FromRow;

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: i64,
    pub department_id: i64,
    pub designation: Option<String>,
    pub salary: Option<f64>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<i64>,
    pub department_id: Option<i64>,
    pub designation: Option<String>,
    pub salary: Option<f64>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct EmployeeResponse {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: i64,
    pub company_name: String,
    pub department_id: i64,
    pub department_name: String,
    pub designation: Option<String>,
    pub salary: f64,
    pub hire_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
