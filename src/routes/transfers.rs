use axum::{routing::get, Router};
use crate::handlers::transfer::{
    create_transfer, delete_transfer, get_transfer, list_transfers, update_transfer,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers", get(list_transfers).post(create_transfer))
        .route(
            "/transfers/{id}",
            get(get_transfer).put(update_transfer).delete(delete_transfer),
        )
}
