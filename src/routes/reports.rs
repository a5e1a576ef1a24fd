use axum::{routing::get, Router};
use crate::handlers::report::{sales_report, stock_report, summary, top_products};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/summary", get(summary))
        .route("/reports/sales", get(sales_report))
        .route("/reports/top-products", get(top_products))
        .route("/reports/stock", get(stock_report))
}
