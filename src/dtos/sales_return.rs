use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveDate};
use sqlx::FromRow;

#[derive(Debug, Deserialize)]
pub struct CreateSalesReturnRequest {
    pub sale_id: Option<i64>,
    pub customer_id: i64,
    pub warehouse_id: i64,
    pub return_date: NaiveDate,
    pub note: Option<String>,
    pub items: Vec<ReturnItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnItemRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SalesReturnResponse {
    pub id: i64,
    pub reference: String,
    pub sale_id: Option<i64>,
    pub customer_id: i64,
    pub customer_name: String,
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub return_date: NaiveDate,
    pub total_amount: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ReturnItemResponse>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ReturnItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SalesReturnListItem {
    pub id: i64,
    pub reference: String,
    pub customer_name: String,
    pub warehouse_name: String,
    pub return_date: NaiveDate,
    pub total_amount: f64,
    pub total_items: i64,
}
