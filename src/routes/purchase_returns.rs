use axum::{routing::get, Router};
use crate::handlers::purchase_return::{
    create_purchase_return, delete_purchase_return, get_purchase_return, list_purchase_returns,
    update_purchase_return,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchase-returns",
            get(list_purchase_returns).post(create_purchase_return),
        )
        .route(
            "/purchase-returns/{id}",
            get(get_purchase_return)
                .put(update_purchase_return)
                .delete(delete_purchase_return),
        )
}
