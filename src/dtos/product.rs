// src/dtos/product.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub code: String,
    pub category_id: i64,
    pub brand_id: Option<i64>,
    pub unit_id: i64,
    pub warehouse_id: Option<i64>,
    pub cost: f64,
    pub price: f64,
    /// Opening stock. Later changes go through adjustments, not product edits.
    pub stock: Option<i64>,
    pub alert_quantity: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub cost: Option<f64>,
    pub price: Option<f64>,
    pub alert_quantity: Option<i64>,
    pub description: Option<String>,
}

/// Product row joined with its lookup display names.
#[derive(Debug, Serialize, FromRow)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub category_id: i64,
    pub category_name: String,
    pub brand_id: Option<i64>,
    pub brand_name: Option<String>,
    pub unit_id: i64,
    pub unit_name: String,
    pub warehouse_id: Option<i64>,
    pub warehouse_name: Option<String>,
    pub cost: f64,
    pub price: f64,
    pub stock: i64,
    pub alert_quantity: i64,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
