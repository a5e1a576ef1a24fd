use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::settings::{get_settings, update_settings, upload_logo};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/logo", post(upload_logo))
}
