use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub company_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    pub company_id: Option<i64>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct DepartmentResponse {
    pub id: i64,
    pub name: String,
    pub company_id: i64,
    pub company_name: String,
}
