use axum::extract::{Query, State};
use axum::Json;
use tracing::instrument;

use crate::dtos::report::{
    DateRangeParams, SalesByDay, StockAlert, SummaryReport, TopProduct, TopProductsParams,
};
use crate::error::AppError;
use crate::state::AppState;

// GET /reports/summary - Dashboard counters and totals
#[instrument(skip(state))]
pub async fn summary(State(state): State<AppState>) -> Result<Json<SummaryReport>, AppError> {
    let pool = &state.db_pool;

    let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(pool)
        .await?;
    let suppliers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
        .fetch_one(pool)
        .await?;
    let (sales_count, sales_total): (i64, f64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total_amount), 0) FROM sales")
            .fetch_one(pool)
            .await?;
    let (purchases_count, purchases_total): (i64, f64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total_amount), 0) FROM purchases")
            .fetch_one(pool)
            .await?;
    let expenses_total: f64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM expenses")
        .fetch_one(pool)
        .await?;

    Ok(Json(SummaryReport {
        products,
        customers,
        suppliers,
        sales_count,
        sales_total,
        purchases_count,
        purchases_total,
        expenses_total,
    }))
}

// GET /reports/sales?start_date=&end_date= - Revenue per day
#[instrument(skip(state))]
pub async fn sales_report(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<Vec<SalesByDay>>, AppError> {
    let mut where_sql = String::from("WHERE 1=1");
    if params.start_date.is_some() {
        where_sql.push_str(" AND sale_date >= ?");
    }
    if params.end_date.is_some() {
        where_sql.push_str(" AND sale_date <= ?");
    }

    let sql = format!(
        "SELECT sale_date, COUNT(*) AS orders, COALESCE(SUM(total_amount), 0) AS total_amount
         FROM sales {where_sql}
         GROUP BY sale_date
         ORDER BY sale_date"
    );
    let mut query = sqlx::query_as::<_, SalesByDay>(&sql);
    if let Some(start) = params.start_date {
        query = query.bind(start);
    }
    if let Some(end) = params.end_date {
        query = query.bind(end);
    }

    let rows = query.fetch_all(&state.db_pool).await?;
    Ok(Json(rows))
}

// GET /reports/top-products?limit= - Best sellers by quantity
#[instrument(skip(state))]
pub async fn top_products(
    State(state): State<AppState>,
    Query(params): Query<TopProductsParams>,
) -> Result<Json<Vec<TopProduct>>, AppError> {
    let limit = params.limit.unwrap_or(5).clamp(1, 50);

    let rows = sqlx::query_as::<_, TopProduct>(
        "SELECT p.id AS product_id, p.name, p.code,
                CAST(COALESCE(SUM(si.quantity), 0) AS SIGNED) AS total_quantity,
                COALESCE(SUM(si.line_total), 0) AS total_amount
         FROM sale_items si
         JOIN products p ON si.product_id = p.id
         GROUP BY p.id, p.name, p.code
         ORDER BY total_quantity DESC, total_amount DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rows))
}

// GET /reports/stock - Products at or below their alert threshold
#[instrument(skip(state))]
pub async fn stock_report(
    State(state): State<AppState>,
) -> Result<Json<Vec<StockAlert>>, AppError> {
    let rows = sqlx::query_as::<_, StockAlert>(
        "SELECT id, name, code, stock, alert_quantity
         FROM products
         WHERE stock <= alert_quantity
         ORDER BY stock, name",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rows))
}
