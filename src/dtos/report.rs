use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use sqlx::FromRow;

/// Dashboard counters and money totals across the whole dataset.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub products: i64,
    pub customers: i64,
    pub suppliers: i64,
    pub sales_count: i64,
    pub sales_total: f64,
    pub purchases_count: i64,
    pub purchases_total: f64,
    pub expenses_total: f64,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SalesByDay {
    pub sale_date: NaiveDate,
    pub orders: i64,
    pub total_amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct TopProductsParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub code: String,
    pub total_quantity: i64,
    pub total_amount: f64,
}

/// Products at or below their alert threshold.
#[derive(Debug, Serialize, FromRow)]
pub struct StockAlert {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub stock: i64,
    pub alert_quantity: i64,
}
