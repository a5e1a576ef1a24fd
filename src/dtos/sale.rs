use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveDate};
use sqlx::FromRow;

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: i64,
    pub warehouse_id: i64,
    pub sale_date: NaiveDate,
    pub paid_amount: Option<f64>,
    pub note: Option<String>,
    pub items: Vec<SaleItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Option<f64>, // defaults to the product's selling price
}

/// Header fields are patched; when `items` is present the line items are
/// replaced wholesale and stock is rebalanced.
#[derive(Debug, Deserialize)]
pub struct UpdateSaleRequest {
    pub customer_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub sale_date: Option<NaiveDate>,
    pub paid_amount: Option<f64>,
    pub note: Option<String>,
    pub items: Option<Vec<SaleItemRequest>>,
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub id: i64,
    pub reference: String,
    pub customer_id: i64,
    pub customer_name: String,
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub sale_date: NaiveDate,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub payment_status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItemResponse>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SaleItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SaleListItem {
    pub id: i64,
    pub reference: String,
    pub customer_name: String,
    pub warehouse_name: String,
    pub sale_date: NaiveDate,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub payment_status: String,
    pub total_items: i64,
}

/// Derived, never stored ad hoc: paid covers total -> paid, zero -> pending,
/// anything between -> partial.
pub fn payment_status(total: f64, paid: f64) -> &'static str {
    if paid >= total {
        "paid"
    } else if paid > 0.0 {
        "partial"
    } else {
        "pending"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_thresholds() {
        assert_eq!(payment_status(100.0, 100.0), "paid");
        assert_eq!(payment_status(100.0, 150.0), "paid");
        assert_eq!(payment_status(100.0, 40.0), "partial");
        assert_eq!(payment_status(100.0, 0.0), "pending");
        assert_eq!(payment_status(0.0, 0.0), "paid");
    }
}
