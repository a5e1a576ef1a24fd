use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveDate};
use sqlx::FromRow;

// Expense categories are a plain lookup; expenses join the category name.

#[derive(Debug, Deserialize)]
pub struct CreateExpenseCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ExpenseCategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub category_id: i64,
    pub warehouse_id: Option<i64>,
    pub amount: f64,
    pub expense_date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub category_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub amount: Option<f64>,
    pub expense_date: Option<NaiveDate>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ExpenseResponse {
    pub id: i64,
    pub reference: String,
    pub category_id: i64,
    pub category_name: String,
    pub warehouse_id: Option<i64>,
    pub warehouse_name: Option<String>,
    pub amount: f64,
    pub expense_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
