use axum::{routing::get, Router};
use crate::handlers::sale::{create_sale, delete_sale, get_sale, list_sales, update_sale};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route(
            "/sales/{id}",
            get(get_sale).put(update_sale).delete(delete_sale),
        )
}
