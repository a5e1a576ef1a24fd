use axum::{routing::get, Router};
use crate::handlers::sales_return::{
    create_sales_return, delete_sales_return, get_sales_return, list_sales_returns,
    update_sales_return,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sales-returns",
            get(list_sales_returns).post(create_sales_return),
        )
        .route(
            "/sales-returns/{id}",
            get(get_sales_return)
                .put(update_sales_return)
                .delete(delete_sales_return),
        )
}
