use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveDate};
use sqlx::FromRow;

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub supplier_id: i64,
    pub warehouse_id: i64,
    pub purchase_date: NaiveDate,
    pub paid_amount: Option<f64>,
    pub note: Option<String>,
    pub items: Vec<PurchaseItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseItemRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Option<f64>, // defaults to the product's cost
}

#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseRequest {
    pub supplier_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub purchase_date: Option<NaiveDate>,
    pub paid_amount: Option<f64>,
    pub note: Option<String>,
    pub items: Option<Vec<PurchaseItemRequest>>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub id: i64,
    pub reference: String,
    pub supplier_id: i64,
    pub supplier_name: String,
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub purchase_date: NaiveDate,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub payment_status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PurchaseItemResponse>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PurchaseItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PurchaseListItem {
    pub id: i64,
    pub reference: String,
    pub supplier_name: String,
    pub warehouse_name: String,
    pub purchase_date: NaiveDate,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub payment_status: String,
    pub total_items: i64,
}
