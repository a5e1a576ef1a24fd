use axum::{routing::get, Router};
use crate::handlers::brand::{create_brand, delete_brand, get_brand, list_brands, update_brand};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/brands", get(list_brands).post(create_brand))
        .route(
            "/brands/{id}",
            get(get_brand).put(update_brand).delete(delete_brand),
        )
}
