use axum::{routing::get, Router};
use crate::handlers::unit::{create_unit, delete_unit, get_unit, list_units, update_unit};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/units", get(list_units).post(create_unit))
        .route(
            "/units/{id}",
            get(get_unit).put(update_unit).delete(delete_unit),
        )
}
