use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveDate};
use sqlx::FromRow;

#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    pub from_warehouse_id: i64,
    pub to_warehouse_id: i64,
    pub transfer_date: NaiveDate,
    pub note: Option<String>,
    pub items: Vec<TransferItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct TransferItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub id: i64,
    pub reference: String,
    pub from_warehouse_id: i64,
    pub from_warehouse_name: String,
    pub to_warehouse_id: i64,
    pub to_warehouse_name: String,
    pub transfer_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<TransferItemResponse>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TransferItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TransferListItem {
    pub id: i64,
    pub reference: String,
    pub from_warehouse_name: String,
    pub to_warehouse_name: String,
    pub transfer_date: NaiveDate,
    pub total_items: i64,
}
