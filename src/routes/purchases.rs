use axum::{routing::get, Router};
use crate::handlers::purchase::{
    create_purchase, delete_purchase, get_purchase, list_purchases, update_purchase,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(list_purchases).post(create_purchase))
        .route(
            "/purchases/{id}",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
}
