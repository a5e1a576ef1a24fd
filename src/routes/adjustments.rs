use axum::{routing::get, Router};
use crate::handlers::adjustment::{
    create_adjustment, delete_adjustment, get_adjustment, list_adjustments, update_adjustment,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/adjustments", get(list_adjustments).post(create_adjustment))
        .route(
            "/adjustments/{id}",
            get(get_adjustment)
                .put(update_adjustment)
                .delete(delete_adjustment),
        )
}
