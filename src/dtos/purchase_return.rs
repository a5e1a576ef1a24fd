use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveDate};
use sqlx::FromRow;

use crate::dtos::sales_return::ReturnItemRequest;

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseReturnRequest {
    pub purchase_id: Option<i64>,
    pub supplier_id: i64,
    pub warehouse_id: i64,
    pub return_date: NaiveDate,
    pub note: Option<String>,
    pub items: Vec<ReturnItemRequest>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseReturnResponse {
    pub id: i64,
    pub reference: String,
    pub purchase_id: Option<i64>,
    pub supplier_id: i64,
    pub supplier_name: String,
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub return_date: NaiveDate,
    pub total_amount: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PurchaseReturnItemResponse>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PurchaseReturnItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PurchaseReturnListItem {
    pub id: i64,
    pub reference: String,
    pub supplier_name: String,
    pub warehouse_name: String,
    pub return_date: NaiveDate,
    pub total_amount: f64,
    pub total_items: i64,
}
