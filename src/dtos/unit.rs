use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Deserialize)]
pub struct CreateUnitRequest {
    pub name: String,
    pub short_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUnitRequest {
    pub name: Option<String>,
    pub short_name: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct UnitResponse {
    pub id: i64,
    pub name: String,
    pub short_name: String,
}
