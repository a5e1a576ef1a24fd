use axum::{routing::get, Router};
use crate::handlers::attendance::{
    create_attendance, delete_attendance, get_attendance, list_attendances, update_attendance,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attendances", get(list_attendances).post(create_attendance))
        .route(
            "/attendances/{id}",
            get(get_attendance)
                .put(update_attendance)
                .delete(delete_attendance),
        )
}
