use axum::{routing::get, Router};
use crate::handlers::warehouse::{
    create_warehouse, delete_warehouse, get_warehouse, list_warehouses, update_warehouse,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
        .route(
            "/warehouses/{id}",
            get(get_warehouse)
                .put(update_warehouse)
                .delete(delete_warehouse),
        )
}
