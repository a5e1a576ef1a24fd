use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::MySqlPool;
use tracing::instrument;

use crate::dtos::expense::{
    CreateExpenseCategoryRequest, CreateExpenseRequest, ExpenseCategoryResponse, ExpenseResponse,
    UpdateExpenseCategoryRequest, UpdateExpenseRequest,
};
use crate::error::{map_fk_violation, map_unique_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::reference;
use crate::state::AppState;

const EXPENSE_SELECT: &str = "SELECT e.id, e.reference, e.category_id, ec.name AS category_name,
        e.warehouse_id, w.name AS warehouse_name, e.amount, e.expense_date, e.note, e.created_at
    FROM expenses e
    JOIN expense_categories ec ON e.category_id = ec.id
    LEFT JOIN warehouses w ON e.warehouse_id = w.id";

// ==================== Expense categories ====================

// GET /expense-categories
pub async fn list_expense_categories(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<ExpenseCategoryResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["name"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM expense_categories {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!(
        "SELECT id, name, description FROM expense_categories {where_sql} ORDER BY name LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, ExpenseCategoryResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone());
    }
    let categories = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(categories, total, page, limit)))
}

// GET /expense-categories/:id
pub async fn get_expense_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ExpenseCategoryResponse>, AppError> {
    fetch_expense_category(&state.db_pool, id).await.map(Json)
}

// POST /expense-categories
pub async fn create_expense_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateExpenseCategoryRequest>,
) -> Result<(StatusCode, Json<ExpenseCategoryResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Expense category name is required"));
    }

    let result = sqlx::query("INSERT INTO expense_categories (name, description) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(&payload.description)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_unique_violation(e, "Expense category name already exists"))?;

    let category = fetch_expense_category(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// PUT /expense-categories/:id
pub async fn update_expense_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateExpenseCategoryRequest>,
) -> Result<Json<ExpenseCategoryResponse>, AppError> {
    sqlx::query(
        "UPDATE expense_categories SET
         name = COALESCE(?, name),
         description = COALESCE(?, description)
         WHERE id = ?",
    )
    .bind(payload.name)
    .bind(payload.description)
    .bind(id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Expense category name already exists"))?;

    fetch_expense_category(&state.db_pool, id).await.map(Json)
}

// DELETE /expense-categories/:id
pub async fn delete_expense_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM expense_categories WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Category has recorded expenses"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Expense category not found"));
    }

    Ok(Json(()))
}

// ==================== Expenses ====================

// GET /expenses - List expenses; optional category_id filter
#[instrument(skip(state))]
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Paginated<ExpenseResponse>>, AppError> {
    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["e.reference", "ec.name"]));
    }
    if filter.category_id.is_some() {
        where_sql.push_str(" AND e.category_id = ?");
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM expenses e JOIN expense_categories ec ON e.category_id = ec.id {where_sql}"
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    if let Some(category_id) = filter.category_id {
        count_query = count_query.bind(category_id);
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql =
        format!("{EXPENSE_SELECT} {where_sql} ORDER BY e.expense_date DESC, e.id DESC LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, ExpenseResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    if let Some(category_id) = filter.category_id {
        rows_query = rows_query.bind(category_id);
    }
    let expenses = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(expenses, total, page, limit)))
}

#[derive(Debug, serde::Deserialize)]
pub struct ExpenseFilter {
    pub category_id: Option<i64>,
}

// GET /expenses/:id
pub async fn get_expense(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ExpenseResponse>, AppError> {
    fetch_expense(&state.db_pool, id).await.map(Json)
}

// POST /expenses
#[instrument(skip(state, payload))]
pub async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), AppError> {
    if payload.amount <= 0.0 {
        return Err(AppError::validation("Amount must be greater than 0"));
    }

    let category: Option<i64> = sqlx::query_scalar("SELECT id FROM expense_categories WHERE id = ?")
        .bind(payload.category_id)
        .fetch_optional(&state.db_pool)
        .await?;
    if category.is_none() {
        return Err(AppError::not_found("Expense category not found"));
    }

    let result = sqlx::query(
        "INSERT INTO expenses (reference, category_id, warehouse_id, amount, expense_date, note)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(reference::generate("EXP"))
    .bind(payload.category_id)
    .bind(payload.warehouse_id)
    .bind(payload.amount)
    .bind(payload.expense_date)
    .bind(&payload.note)
    .execute(&state.db_pool)
    .await?;

    let expense = fetch_expense(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

// PUT /expenses/:id
#[instrument(skip(state, payload), fields(id))]
pub async fn update_expense(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> Result<Json<ExpenseResponse>, AppError> {
    if payload.amount.is_some_and(|a| a <= 0.0) {
        return Err(AppError::validation("Amount must be greater than 0"));
    }

    sqlx::query(
        "UPDATE expenses SET
         category_id = COALESCE(?, category_id),
         warehouse_id = COALESCE(?, warehouse_id),
         amount = COALESCE(?, amount),
         expense_date = COALESCE(?, expense_date),
         note = COALESCE(?, note)
         WHERE id = ?",
    )
    .bind(payload.category_id)
    .bind(payload.warehouse_id)
    .bind(payload.amount)
    .bind(payload.expense_date)
    .bind(payload.note)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_expense(&state.db_pool, id).await.map(Json)
}

// DELETE /expenses/:id
pub async fn delete_expense(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<()>, AppError> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Expense not found"));
    }

    Ok(Json(()))
}

async fn fetch_expense_category(
    pool: &MySqlPool,
    id: i64,
) -> Result<ExpenseCategoryResponse, AppError> {
    sqlx::query_as::<_, ExpenseCategoryResponse>(
        "SELECT id, name, description FROM expense_categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Expense category not found"))
}

async fn fetch_expense(pool: &MySqlPool, id: i64) -> Result<ExpenseResponse, AppError> {
    sqlx::query_as::<_, ExpenseResponse>(&format!("{EXPENSE_SELECT} WHERE e.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Expense not found"))
}
